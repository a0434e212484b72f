/// Termination and mixing settings for the self-consistency loop
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Convergence {
    pub(crate) mixing: f64,
    pub(crate) maximum_iterations: usize,
    pub(crate) tolerance: Option<f64>,
    pub(crate) abort_tolerance: Option<f64>,
    pub(crate) strict: bool,
}

impl Convergence {
    pub(crate) fn mixing(&self) -> f64 {
        self.mixing
    }

    pub(crate) fn maximum_iterations(&self) -> usize {
        self.maximum_iterations
    }

    pub(crate) fn tolerance(&self) -> Option<f64> {
        self.tolerance
    }

    pub(crate) fn abort_tolerance(&self) -> Option<f64> {
        self.abort_tolerance
    }

    pub(crate) fn is_strict(&self) -> bool {
        self.strict
    }
}
