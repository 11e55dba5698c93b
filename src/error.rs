//! Error types for the VR calculation engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate.
//! Only structural problems become errors: a missing source file, or a table
//! whose required columns cannot be recognized at all. Bad data inside a
//! single row never aborts a run; it degrades to a safe default and is
//! recorded in the stage audit log instead.

use thiserror::Error;

/// The main error type for the VR calculation engine.
///
/// All pipeline stages return this error type, making it easy to handle
/// failures consistently at the caller.
///
/// # Example
///
/// ```
/// use vr_engine::error::EngineError;
///
/// let error = EngineError::SourceNotFound {
///     path: "/input/ATIVOS.csv".to_string(),
/// };
/// assert_eq!(error.to_string(), "Source file not found: /input/ATIVOS.csv");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// A required source or checkpoint file was not found.
    #[error("Source file not found: {path}")]
    SourceNotFound {
        /// The path that was not found.
        path: String,
    },

    /// A required column could not be recognized in a source table.
    #[error("Required column not found in '{path}': expected one of {expected}")]
    MissingColumn {
        /// The path to the table that was missing the column.
        path: String,
        /// A description of the accepted column names.
        expected: String,
    },

    /// A delimited table could not be read or written.
    #[error("Failed to read or write table: {0}")]
    Csv(#[from] csv::Error),

    /// An underlying I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A general pipeline error occurred.
    #[error("Pipeline error: {message}")]
    PipelineError {
        /// A description of the pipeline error.
        message: String,
    },
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_not_found_displays_path() {
        let error = EngineError::SourceNotFound {
            path: "/input/FERIAS.csv".to_string(),
        };
        assert_eq!(error.to_string(), "Source file not found: /input/FERIAS.csv");
    }

    #[test]
    fn test_missing_column_displays_path_and_expected() {
        let error = EngineError::MissingColumn {
            path: "/input/valores.csv".to_string(),
            expected: "SINDICATO, SINDICADO, ESTADO".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Required column not found in '/input/valores.csv': \
             expected one of SINDICATO, SINDICADO, ESTADO"
        );
    }

    #[test]
    fn test_pipeline_error_displays_message() {
        let error = EngineError::PipelineError {
            message: "no checkpoint available".to_string(),
        };
        assert_eq!(error.to_string(), "Pipeline error: no checkpoint available");
    }

    #[test]
    fn test_io_error_converts() {
        fn fails() -> EngineResult<String> {
            let content = std::fs::read_to_string("/nonexistent/file")?;
            Ok(content)
        }
        assert!(matches!(fails(), Err(EngineError::Io(_))));
    }

    #[test]
    fn test_errors_implement_std_error() {
        fn assert_error<T: std::error::Error>() {}
        assert_error::<EngineError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn returns_source_not_found() -> EngineResult<()> {
            Err(EngineError::SourceNotFound {
                path: "/test".to_string(),
            })
        }

        fn propagates_error() -> EngineResult<()> {
            returns_source_not_found()?;
            Ok(())
        }

        assert!(propagates_error().is_err());
    }
}
