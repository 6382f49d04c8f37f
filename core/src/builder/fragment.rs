//! 带占位符位置的 SQL 片段
//!
//! 片段在加入时就记录每个占位符对应的参数位置（从 1 开始），
//! 生成时再把位置转换为方言占位符（可整体偏移），不需要重新扫描文本。

use crate::dialect::Dialect;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment {
    Sql(String),
    Param(usize),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Fragment {
    segments: Vec<Segment>,
}

impl Fragment {
    pub fn sql(text: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Sql(text.into())],
        }
    }

    /// 拆分 `?` 模板，占位符从 `start` 开始编号
    pub fn parse(template: &str, start: usize) -> Self {
        let mut fragment = Self::default();
        let mut next = start;
        for (i, piece) in template.split('?').enumerate() {
            if i > 0 {
                fragment.segments.push(Segment::Param(next));
                next += 1;
            }
            fragment.push_sql(piece);
        }
        fragment
    }

    /// 从 `start` 开始的 `count` 个连续占位符
    pub fn allocate(start: usize, count: usize) -> Vec<Segment> {
        (start..start + count).map(Segment::Param).collect()
    }

    pub fn push_sql(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Segment::Sql(last)) = self.segments.last_mut() {
            last.push_str(text);
        } else {
            self.segments.push(Segment::Sql(text.to_string()));
        }
    }

    pub fn push(&mut self, segment: Segment) {
        match segment {
            Segment::Sql(text) => self.push_sql(&text),
            param => self.segments.push(param),
        }
    }

    pub fn append(&mut self, other: Fragment) {
        for segment in other.segments {
            self.push(segment);
        }
    }

    pub fn param_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Param(_)))
            .count()
    }

    /// `(self OR other)`
    pub fn or(self, other: Fragment) -> Fragment {
        let mut combined = Fragment::sql("(");
        combined.append(self);
        combined.push_sql(" OR ");
        combined.append(other);
        combined.push_sql(")");
        combined
    }

    /// 生成 SQL，所有占位符位置整体后移 `shift`
    pub fn render(&self, dialect: Dialect, shift: usize) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Sql(text) => out.push_str(text),
                Segment::Param(index) => out.push_str(&dialect.placeholder(index + shift)),
            }
        }
        out
    }
}

pub(crate) fn render_joined(
    fragments: &[Fragment],
    separator: &str,
    dialect: Dialect,
    shift: usize,
) -> String {
    fragments
        .iter()
        .map(|f| f.render(dialect, shift))
        .collect::<Vec<_>>()
        .join(separator)
}
