//! End-of-unit report: segment usage and variables

use std::fmt;

/// Column limit of the variable listing
pub const LINE_WIDTH: usize = 72;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentReport {
    pub start: u32,
    pub size: u32,
    pub used: u32,
}

impl SegmentReport {
    pub fn unused(&self) -> u32 {
        self.size.saturating_sub(self.used)
    }
}

impl fmt::Display for SegmentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            " Segment at {:04x} size {:3} used {:3} unused {:3}",
            self.start,
            self.size,
            self.used,
            self.unused()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableReport {
    pub name: String,
    pub address: u8,
    /// Size of the procedure last assigned to it, when known
    pub length: Option<u32>,
}

impl fmt::Display for VariableReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.length {
            Some(length) => write!(f, "{} [{}]", self.name, length),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub segments: Vec<SegmentReport>,
    /// Sorted by name
    pub variables: Vec<VariableReport>,
    /// Next free zero-page byte after allocation
    pub zp_end: u8,
}

impl Summary {
    pub fn variable_header(&self) -> String {
        format!(
            " Variables count {} bytes {} end {:04x}",
            self.variables.len(),
            2 * self.variables.len(),
            self.zp_end
        )
    }

    /// Variable names packed into lines starting with ` :`
    pub fn variable_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut line = String::from(" :");
        for var in &self.variables {
            let entry = var.to_string();
            if line.len() + entry.len() + 1 > LINE_WIDTH {
                lines.push(std::mem::replace(&mut line, String::from(" :")));
            }
            line.push(' ');
            line.push_str(&entry);
        }
        lines.push(line);
        lines
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            writeln!(f, "{}", segment)?;
        }
        writeln!(f, "{}", self.variable_header())?;
        for line in self.variable_lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, length: Option<u32>) -> VariableReport {
        VariableReport {
            name: name.to_string(),
            address: 0x30,
            length,
        }
    }

    #[test]
    fn test_segment_line() {
        let report = SegmentReport {
            start: 0x0200,
            size: 250,
            used: 17,
        };
        assert_eq!(
            report.to_string(),
            " Segment at 0200 size 250 used  17 unused 233"
        );
    }

    #[test]
    fn test_empty_variable_listing() {
        let summary = Summary::default();
        assert_eq!(summary.variable_lines(), vec![" :".to_string()]);
        assert_eq!(
            summary.variable_header(),
            " Variables count 0 bytes 0 end 0000"
        );
    }

    #[test]
    fn test_lengths_are_shown() {
        let summary = Summary {
            variables: vec![var("Draw", Some(42)), var("x", None)],
            ..Summary::default()
        };
        assert_eq!(summary.variable_lines(), vec![" : Draw [42] x".to_string()]);
    }

    #[test]
    fn test_wrapping() {
        let names: Vec<_> = (0..20).map(|i| var(&format!("Var{:02}", i), None)).collect();
        let summary = Summary {
            variables: names,
            ..Summary::default()
        };
        let lines = summary.variable_lines();
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.starts_with(" :"));
            assert!(line.len() <= LINE_WIDTH);
        }
        let joined: Vec<&str> = lines
            .iter()
            .flat_map(|l| l[2..].split_whitespace())
            .collect();
        assert_eq!(joined.len(), 20);
    }
}
