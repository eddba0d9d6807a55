use std::fmt;

/// Identity of a derived series: indicator name, its integer parameters and,
/// for multi-output indicators, which output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndicatorKey {
    name: &'static str,
    params: Vec<usize>,
    output: Option<&'static str>,
}

impl IndicatorKey {
    pub fn new(name: &'static str, params: &[usize]) -> Self {
        IndicatorKey {
            name,
            params: params.to_vec(),
            output: None,
        }
    }

    pub fn with_output(&self, output: &'static str) -> Self {
        IndicatorKey {
            output: Some(output),
            ..self.clone()
        }
    }

    /// Key under which output `index` of an indicator is cached; the primary
    /// output (index 0) uses the bare key.
    pub fn for_output(&self, index: usize, output: &'static str) -> Self {
        if index == 0 {
            self.clone()
        } else {
            self.with_output(output)
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn params(&self) -> &[usize] {
        &self.params
    }

    pub fn output(&self) -> Option<&'static str> {
        self.output
    }
}

impl fmt::Display for IndicatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)?;
        for param in &self.params {
            write!(f, "-{}", param)?;
        }
        if let Some(output) = self.output {
            write!(f, ":{}", output)?;
        }
        Ok(())
    }
}
