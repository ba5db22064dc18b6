//! Loading test programs
//!
//! A test program is anything that can drive a [`TestProducer`]. A
//! [`TestLoader`] resolves the path given on the command line to one.

use crate::error::{Flow, Result};
use crate::producer::TestProducer;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Code that produces a TAP stream
pub trait TestProgram {
    fn run(&self, producer: &mut TestProducer) -> Flow;
}

impl<F> TestProgram for F
where
    F: Fn(&mut TestProducer) -> Flow,
{
    fn run(&self, producer: &mut TestProducer) -> Flow {
        self(producer)
    }
}

/// Resolves paths to test programs
pub trait TestLoader {
    /// Load the program at `path`, or `None` if there is nothing there.
    fn load(&self, path: &Path) -> Result<Option<Rc<dyn TestProgram>>>;
}

/// Test programs registered in-process under a path
#[derive(Default)]
pub struct ProgramRegistry {
    programs: HashMap<PathBuf, Rc<dyn TestProgram>>,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P>(&mut self, path: impl Into<PathBuf>, program: P) -> &mut Self
    where
        P: TestProgram + 'static,
    {
        self.programs.insert(path.into(), Rc::new(program));
        self
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

impl TestLoader for ProgramRegistry {
    fn load(&self, path: &Path) -> Result<Option<Rc<dyn TestProgram>>> {
        Ok(self.programs.get(path).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    #[test]
    fn test_registry_load() {
        let mut registry = ProgramRegistry::new();
        registry.register("t/one.t", |p: &mut TestProducer| -> Flow {
            p.assert(true, "one")?;
            Ok(())
        });
        assert_eq!(registry.len(), 1);

        assert!(registry.load(Path::new("t/missing.t")).unwrap().is_none());

        let program = registry.load(Path::new("t/one.t")).unwrap().unwrap();
        let out = MemorySink::new();
        let mut producer = TestProducer::new(Box::new(out.clone()), Box::new(MemorySink::new()));
        producer.startup().unwrap();
        program.run(&mut producer).unwrap();
        assert_eq!(out.lines(), vec!["TAP version 13", "ok 1 - one"]);
    }
}
