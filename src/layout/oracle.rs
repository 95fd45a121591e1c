//! Layout oracle: the injectable "how tall is this markup" capability

use crate::error::{PaginationError, Result};
use crate::layout::font::Typography;

/// Measures the rendered height of markup fragments.
///
/// Implementations wrap a real layout engine (a browser DOM through the
/// WASM bridge), a headless estimator, or a test stub. Measurement happens
/// between `prepare` and `release`, which create and tear down whatever
/// off-screen scaffold the engine needs. Always go through [`MeasureScope`]
/// so that `release` runs on every exit path.
pub trait LayoutOracle {
    /// Whether a layout engine is present at all
    fn is_available(&self) -> bool {
        true
    }

    /// Create the measurement scaffold for a content width
    fn prepare(&mut self, width: f32, typography: &Typography) -> Result<()> {
        let _ = (width, typography);
        Ok(())
    }

    /// Rendered height of `fragment` laid out at `width`
    fn measure(&mut self, fragment: &str, width: f32, typography: &Typography) -> Result<f32>;

    /// Remove the measurement scaffold. Must tolerate repeated calls.
    fn release(&mut self) {}
}

impl<O: LayoutOracle + ?Sized> LayoutOracle for &mut O {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn prepare(&mut self, width: f32, typography: &Typography) -> Result<()> {
        (**self).prepare(width, typography)
    }

    fn measure(&mut self, fragment: &str, width: f32, typography: &Typography) -> Result<f32> {
        (**self).measure(fragment, width, typography)
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Scoped measurement context. Releases the oracle's scaffold on drop,
/// including early returns and unwinding.
pub struct MeasureScope<'a, O: LayoutOracle + ?Sized> {
    oracle: &'a mut O,
    width: f32,
    typography: &'a Typography,
}

impl<'a, O: LayoutOracle + ?Sized> MeasureScope<'a, O> {
    /// Open a scope; fails fast when no layout engine is available
    pub fn open(oracle: &'a mut O, width: f32, typography: &'a Typography) -> Result<Self> {
        if !oracle.is_available() {
            return Err(PaginationError::LayoutUnavailable);
        }
        // Construct the guard first so a failing `prepare` still releases
        let scope = Self {
            oracle,
            width,
            typography,
        };
        scope.oracle.prepare(width, typography)?;
        Ok(scope)
    }

    /// Measure a fragment. `offset` locates it in the source for errors.
    pub fn measure(&mut self, fragment: &str, offset: usize) -> Result<f32> {
        let height = self
            .oracle
            .measure(fragment, self.width, self.typography)
            .map_err(|err| match err {
                PaginationError::Measurement { reason, .. } => {
                    PaginationError::measurement(offset, reason)
                }
                other => other,
            })?;

        if !height.is_finite() || height < 0.0 {
            return Err(PaginationError::measurement(
                offset,
                format!("oracle returned unusable height {}", height),
            ));
        }
        Ok(height)
    }

    pub fn width(&self) -> f32 {
        self.width
    }
}

impl<O: LayoutOracle + ?Sized> Drop for MeasureScope<'_, O> {
    fn drop(&mut self) {
        self.oracle.release();
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StubOracle;
    use super::*;

    #[test]
    fn test_scope_releases_on_drop() {
        let typography = Typography::default();
        let mut oracle = StubOracle::new(10.0);
        {
            let mut scope = MeasureScope::open(&mut oracle, 500.0, &typography).unwrap();
            assert_eq!(scope.measure("<p>x</p>", 0).unwrap(), 10.0);
        }
        assert_eq!(oracle.prepared, 1);
        assert_eq!(oracle.released, 1);
        assert_eq!(oracle.open_scaffolds, 0);
    }

    #[test]
    fn test_scope_releases_on_error() {
        let typography = Typography::default();
        let mut oracle = StubOracle::new(10.0);
        oracle.fail_on = Some("<p>bad</p>".into());

        let result = (|| -> Result<f32> {
            let mut scope = MeasureScope::open(&mut oracle, 500.0, &typography)?;
            scope.measure("<p>bad</p>", 42)
        })();

        match result {
            Err(PaginationError::Measurement { offset, .. }) => assert_eq!(offset, 42),
            other => panic!("expected measurement error, got {:?}", other),
        }
        assert_eq!(oracle.open_scaffolds, 0);
    }

    #[test]
    fn test_scope_releases_when_prepare_fails() {
        let typography = Typography::default();
        let mut oracle = StubOracle::new(10.0);
        oracle.fail_prepare = true;
        assert!(MeasureScope::open(&mut oracle, 500.0, &typography).is_err());
        assert_eq!(oracle.released, 1);
        assert_eq!(oracle.open_scaffolds, 0);
    }

    #[test]
    fn test_unavailable_engine_fails_fast() {
        let typography = Typography::default();
        let mut oracle = StubOracle::new(10.0);
        oracle.unavailable = true;
        assert!(matches!(
            MeasureScope::open(&mut oracle, 500.0, &typography),
            Err(PaginationError::LayoutUnavailable)
        ));
        assert_eq!(oracle.prepared, 0);
    }

    #[test]
    fn test_rejects_unusable_heights() {
        let typography = Typography::default();
        let mut oracle = StubOracle::new(f32::NAN).with("<p>neg</p>", -1.0);
        let mut scope = MeasureScope::open(&mut oracle, 500.0, &typography).unwrap();
        assert!(scope.measure("<p>nan</p>", 0).is_err());
        assert!(scope.measure("<p>neg</p>", 0).is_err());
    }
}
