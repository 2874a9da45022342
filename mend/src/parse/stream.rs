/// Reassembles complete lines from a response that arrives in arbitrary
/// chunks.
#[derive(Debug, Default)]
pub struct LineAccumulator {
    pending: String,
}

impl LineAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed, without the
    /// trailing newline.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.pending.push_str(chunk);

        let Some(last_newline) = self.pending.rfind('\n') else {
            return Vec::new();
        };

        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);
        complete
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect()
    }

    /// The unterminated final line, if it holds anything.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        (!rest.trim().is_empty()).then_some(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_split_across_chunks() {
        let mut lines = LineAccumulator::new();
        assert!(lines.push("\"Him\"|\"He\"|Gram").is_empty());
        assert_eq!(lines.push("mar|x\n\"teh\"|"), vec!["\"Him\"|\"He\"|Grammar|x"]);
        assert_eq!(lines.push("\"the\"|Spelling|y\r\nNONE\n"), vec!["\"teh\"|\"the\"|Spelling|y", "NONE"]);
        assert_eq!(lines.finish(), None);
    }

    #[test]
    fn finish_returns_unterminated_tail() {
        let mut lines = LineAccumulator::new();
        lines.push("a\nb|c");
        assert_eq!(lines.finish().as_deref(), Some("b|c"));
        assert_eq!(lines.finish(), None);
    }

    #[test]
    fn blank_tail_is_dropped() {
        let mut lines = LineAccumulator::new();
        lines.push("x\n   ");
        assert_eq!(lines.finish(), None);
    }
}
