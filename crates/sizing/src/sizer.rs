use serde::Serialize;

use crate::module::{clamp_unit, ModuleMetadata, RiskModule, SizingInputs};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleFactor {
    pub module: String,
    pub factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizingDecision {
    pub size: f64,
    pub factors: Vec<ModuleFactor>,
}

/// Composes risk modules by multiplication, starting from a unit size.
///
/// The module list is taken as given: filtering disabled modules and
/// ordering by priority is done by whoever builds it (see `SizingProfile`).
#[derive(Debug)]
pub struct PositionSizer {
    metadata: ModuleMetadata,
    modules: Vec<Box<dyn RiskModule>>,
}

impl PositionSizer {
    pub fn new(modules: Vec<Box<dyn RiskModule>>) -> Self {
        Self::with_metadata(ModuleMetadata::position_sizer(), modules)
    }

    pub fn with_metadata(metadata: ModuleMetadata, modules: Vec<Box<dyn RiskModule>>) -> Self {
        Self { metadata, modules }
    }

    pub fn metadata(&self) -> &ModuleMetadata {
        &self.metadata
    }

    pub fn compute(&self, inputs: &SizingInputs) -> f64 {
        let size = self
            .modules
            .iter()
            .fold(1.0, |size, module| size * module.adjust(inputs));
        clamp_unit(size)
    }

    /// Same result as `compute`, plus the factor each module contributed.
    pub fn compute_traced(&self, inputs: &SizingInputs) -> SizingDecision {
        let mut size = 1.0;
        let mut factors = Vec::with_capacity(self.modules.len());
        for module in &self.modules {
            let factor = module.adjust(inputs);
            size *= factor;
            factors.push(ModuleFactor {
                module: module.name().to_string(),
                factor,
            });
        }

        SizingDecision {
            size: clamp_unit(size),
            factors,
        }
    }

    pub fn add_module(&mut self, module: Box<dyn RiskModule>) {
        self.modules.push(module);
    }

    /// Removes the module at `index`; out-of-range indices are ignored.
    pub fn remove_module(&mut self, index: usize) -> Option<Box<dyn RiskModule>> {
        if index < self.modules.len() {
            Some(self.modules.remove(index))
        } else {
            None
        }
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|module| module.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
