use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn an input file into a table. Aborts the run for that file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}:{line}: cannot parse timestamp `{value}` with any configured format", .path.display())]
    Timestamp {
        path: PathBuf,
        line: u64,
        value: String,
    },

    #[error("{}: snapshot file has no reference-price row", .path.display())]
    MissingReferencePrices { path: PathBuf },

    #[error("{}: reference price `{value}` is not numeric", .path.display())]
    BadReferencePrice { path: PathBuf, value: String },
}

/// Failure while building a chart from a filtered table.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("schema `{schema}` has no column `{column}`")]
    MissingColumn { schema: String, column: String },

    #[error("serializing figure")]
    Serialize(#[from] serde_json::Error),
}

/// Failure while writing an artifact to disk.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("writing {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("moving finished artifact into place at {}", .path.display())]
    Rename {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("rasterizing {}: {reason}", .path.display())]
    Rasterize { path: PathBuf, reason: String },

    #[error("source file {} has no usable file stem", .path.display())]
    NoStem { path: PathBuf },

    #[error("encoding animation frame {}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Failure talking to an outbound collaborator. Never rolls back an artifact.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    #[error("webhook answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("reading artifact {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything that can stop a single pipeline invocation.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("load failed")]
    Load(#[from] LoadError),

    #[error("render failed")]
    Render(#[from] RenderError),

    #[error("persist failed")]
    Persist(#[from] PersistError),
}
