//! Suite definitions
//!
//! A suite is an ordered list of selectors with the body to run for each,
//! plus optional setUp/tearDown hooks shared by every test.

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use crate::error::{ConfigurationError, StepResult};
use crate::executor::AsyncGuard;

/// Body of a test, run with the test's own guard
pub type TestBody = Rc<dyn Fn(&AsyncGuard) -> StepResult>;

/// setUp / tearDown hook
pub type Hook = Rc<dyn Fn(&AsyncGuard) -> StepResult>;

/// A single named test
#[derive(Clone)]
pub struct TestCase {
    selector: String,
    body: TestBody,
}

impl TestCase {
    pub fn new(
        selector: impl Into<String>,
        body: impl Fn(&AsyncGuard) -> StepResult + 'static,
    ) -> Self {
        Self {
            selector: selector.into(),
            body: Rc::new(body),
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn body(&self) -> TestBody {
        Rc::clone(&self.body)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of tests run as one batch
#[derive(Clone)]
pub struct Suite {
    name: String,
    cases: Vec<TestCase>,
    set_up: Option<Hook>,
    tear_down: Option<Hook>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new(),
            set_up: None,
            tear_down: None,
        }
    }

    /// Append a test
    pub fn with_test(
        mut self,
        selector: impl Into<String>,
        body: impl Fn(&AsyncGuard) -> StepResult + 'static,
    ) -> Self {
        self.cases.push(TestCase::new(selector, body));
        self
    }

    pub fn with_case(mut self, case: TestCase) -> Self {
        self.cases.push(case);
        self
    }

    /// Hook run before each body, inside the body's fault handling
    pub fn with_set_up(mut self, hook: impl Fn(&AsyncGuard) -> StepResult + 'static) -> Self {
        self.set_up = Some(Rc::new(hook));
        self
    }

    /// Hook run once each test's outcome is decided
    pub fn with_tear_down(
        mut self,
        hook: impl Fn(&AsyncGuard) -> StepResult + 'static,
    ) -> Self {
        self.tear_down = Some(Rc::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn set_up(&self) -> Option<Hook> {
        self.set_up.clone()
    }

    pub fn tear_down(&self) -> Option<Hook> {
        self.tear_down.clone()
    }

    /// Selectors in enumeration order
    pub fn selectors(&self) -> Vec<String> {
        self.cases.iter().map(|c| c.selector.clone()).collect()
    }

    pub fn find(&self, selector: &str) -> Option<&TestCase> {
        self.cases.iter().find(|c| c.selector == selector)
    }

    /// Sub-suite with the given selectors, in the given order, sharing hooks
    pub fn select<S: AsRef<str>>(&self, selectors: &[S]) -> Result<Suite, ConfigurationError> {
        let mut cases = Vec::with_capacity(selectors.len());
        for selector in selectors {
            let selector = selector.as_ref();
            let case = self
                .find(selector)
                .ok_or_else(|| ConfigurationError::UnknownTest {
                    suite: self.name.clone(),
                    selector: selector.to_string(),
                })?;
            cases.push(case.clone());
        }

        Ok(Suite {
            name: self.name.clone(),
            cases,
            set_up: self.set_up.clone(),
            tear_down: self.tear_down.clone(),
        })
    }

    /// Check the suite can be run: non-empty with unique selectors
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.cases.is_empty() {
            return Err(ConfigurationError::EmptySuite(self.name.clone()));
        }

        let mut seen = HashSet::new();
        for case in &self.cases {
            if !seen.insert(case.selector.as_str()) {
                return Err(ConfigurationError::DuplicateTest {
                    suite: self.name.clone(),
                    selector: case.selector.clone(),
                });
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("name", &self.name)
            .field("cases", &self.cases)
            .field("set_up", &self.set_up.is_some())
            .field("tear_down", &self.tear_down.is_some())
            .finish()
    }
}
