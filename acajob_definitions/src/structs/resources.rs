/// Container resources as requested by the user
///
/// Both values are kept as the strings the user gave. Memory is passed through
/// to the provider untouched; cpu is only parsed when a document is assembled.
#[derive(Clone, Debug, PartialEq)]
pub struct Resources {
    /// Core count, e.g. "0.5"
    pub cpu: String,
    /// Provider size string, e.g. "1Gi"
    pub memory: String,
}

impl Default for Resources {
    fn default() -> Self {
        Resources {
            cpu: "0.5".into(),
            memory: "1Gi".into(),
        }
    }
}

impl Resources {
    /// Core count as a float
    ///
    /// Unparseable input becomes NaN, which serializes as `null` and gets rejected
    /// by the provider rather than here.
    pub fn cores(&self) -> f64 {
        self.cpu.trim().parse::<f64>().unwrap_or(std::f64::NAN)
    }
}
