//! Calculator registry and factory.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::calculator::{Calculator, FibCalculator};
use crate::error::FibError;
use crate::fastdoubling::FastDoubling;
use crate::fft_based::FftDoubling;
use crate::matrix::MatrixExponentiation;

/// Builds one calculator instance.
pub type Constructor = Arc<dyn Fn() -> Arc<dyn Calculator> + Send + Sync>;

/// Factory interface over the registry.
pub trait CalculatorFactory: Send + Sync {
    /// Build a fresh instance.
    fn create(&self, name: &str) -> Result<Arc<dyn Calculator>, FibError>;

    /// Get the memoized instance (one per name).
    fn get(&self, name: &str) -> Result<Arc<dyn Calculator>, FibError>;

    /// Registered names, sorted for deterministic listings.
    fn list(&self) -> Vec<String>;

    /// Add a constructor under a new name.
    fn register(&self, name: &str, constructor: Constructor) -> Result<(), FibError>;
}

/// Registry pre-loaded with the built-in algorithms.
pub struct DefaultFactory {
    constructors: RwLock<HashMap<String, Constructor>>,
    instances: RwLock<HashMap<String, Arc<dyn Calculator>>>,
}

impl DefaultFactory {
    /// Factory with `fast`, `matrix`, and `fft` registered (plus `gmp`
    /// when compiled in).
    #[must_use]
    pub fn new() -> Self {
        let factory = Self {
            constructors: RwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
        };

        let builtins: [(&str, Constructor); 3] = [
            (
                "fast",
                Arc::new(|| {
                    Arc::new(FibCalculator::new(Arc::new(FastDoubling::new()))) as Arc<dyn Calculator>
                }),
            ),
            (
                "matrix",
                Arc::new(|| {
                    Arc::new(FibCalculator::new(Arc::new(MatrixExponentiation::new())))
                        as Arc<dyn Calculator>
                }),
            ),
            (
                "fft",
                Arc::new(|| {
                    Arc::new(FibCalculator::new(Arc::new(FftDoubling::new()))) as Arc<dyn Calculator>
                }),
            ),
        ];
        for (name, constructor) in builtins {
            factory
                .constructors
                .write()
                .insert(name.to_string(), constructor);
        }

        #[cfg(feature = "gmp")]
        factory.constructors.write().insert(
            "gmp".to_string(),
            Arc::new(|| {
                Arc::new(FibCalculator::new(Arc::new(
                    crate::calculator_gmp::GmpFastDoubling::new(),
                ))) as Arc<dyn Calculator>
            }),
        );

        factory
    }

    fn lookup(&self, name: &str) -> Result<Constructor, FibError> {
        if let Some(constructor) = self.constructors.read().get(name) {
            return Ok(Arc::clone(constructor));
        }
        if name == "gmp" {
            return Err(FibError::Unavailable("gmp backend not compiled in"));
        }
        Err(FibError::InvalidArgument(format!(
            "unknown calculator: {name}"
        )))
    }
}

impl Default for DefaultFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl CalculatorFactory for DefaultFactory {
    fn create(&self, name: &str) -> Result<Arc<dyn Calculator>, FibError> {
        Ok(self.lookup(name)?())
    }

    fn get(&self, name: &str) -> Result<Arc<dyn Calculator>, FibError> {
        if let Some(instance) = self.instances.read().get(name) {
            return Ok(Arc::clone(instance));
        }
        let instance = self.create(name)?;
        self.instances
            .write()
            .insert(name.to_string(), Arc::clone(&instance));
        Ok(instance)
    }

    fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn register(&self, name: &str, constructor: Constructor) -> Result<(), FibError> {
        let mut constructors = self.constructors.write();
        if constructors.contains_key(name) {
            return Err(FibError::InvalidArgument(format!(
                "calculator {name} is already registered"
            )));
        }
        constructors.insert(name.to_string(), constructor);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CalcContext;
    use crate::observers::NoOpObserver;
    use crate::options::Options;
    use num_bigint::BigUint;

    #[test]
    fn builtins_resolve() {
        let factory = DefaultFactory::new();
        assert_eq!(factory.get("fast").unwrap().name(), "FastDoubling");
        assert_eq!(factory.get("matrix").unwrap().name(), "MatrixExponentiation");
        assert_eq!(factory.get("fft").unwrap().name(), "FftDoubling");
    }

    #[test]
    fn get_is_memoized_create_is_not() {
        let factory = DefaultFactory::new();
        let a = factory.get("fast").unwrap();
        let b = factory.get("fast").unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let c = factory.create("fast").unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn unknown_name_is_invalid_argument() {
        let factory = DefaultFactory::new();
        assert!(matches!(
            factory.get("nonexistent"),
            Err(FibError::InvalidArgument(_))
        ));
    }

    #[cfg(not(feature = "gmp"))]
    #[test]
    fn gmp_without_feature_is_unavailable() {
        let factory = DefaultFactory::new();
        assert!(matches!(
            factory.get("gmp"),
            Err(FibError::Unavailable(_))
        ));
    }

    #[test]
    fn list_is_sorted() {
        let factory = DefaultFactory::new();
        let names = factory.list();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(names.contains(&"fast".to_string()));
        assert!(names.contains(&"matrix".to_string()));
        assert!(names.contains(&"fft".to_string()));
    }

    #[test]
    fn register_and_use_a_custom_calculator() {
        let factory = DefaultFactory::new();
        factory
            .register(
                "fast2",
                Arc::new(|| {
                    Arc::new(FibCalculator::new(Arc::new(FastDoubling::new())))
                        as Arc<dyn Calculator>
                }),
            )
            .unwrap();

        let calc = factory.get("fast2").unwrap();
        let result = calc
            .calculate(
                &CalcContext::new(),
                &NoOpObserver::new(),
                0,
                10,
                &Options::default(),
            )
            .unwrap();
        assert_eq!(result, BigUint::from(55u32));
        assert!(factory.list().contains(&"fast2".to_string()));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let factory = DefaultFactory::new();
        let result = factory.register(
            "fast",
            Arc::new(|| {
                Arc::new(FibCalculator::new(Arc::new(FastDoubling::new()))) as Arc<dyn Calculator>
            }),
        );
        assert!(matches!(result, Err(FibError::InvalidArgument(_))));
    }

    #[test]
    fn all_builtins_agree_on_f500() {
        let factory = DefaultFactory::new();
        let ctx = CalcContext::new();
        let observer = NoOpObserver::new();
        let opts = Options::default();

        let reference = factory
            .get("fast")
            .unwrap()
            .calculate(&ctx, &observer, 0, 500, &opts)
            .unwrap();
        for name in ["matrix", "fft"] {
            let result = factory
                .get(name)
                .unwrap()
                .calculate(&ctx, &observer, 0, 500, &opts)
                .unwrap();
            assert_eq!(result, reference, "{name} disagrees with fast");
        }
    }
}
