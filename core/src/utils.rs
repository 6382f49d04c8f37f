/// 规范化排序方向
///
/// # 返回值
///
/// 忽略大小写等于 `"DESC"` 时返回 `"DESC"`，其它输入（包括带空白的值）返回 `"ASC"`。
pub fn validate_direction(direction: &str) -> &'static str {
    if direction.eq_ignore_ascii_case("DESC") {
        "DESC"
    } else {
        "ASC"
    }
}
