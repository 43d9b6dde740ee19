//! Object options shared by the library and the CLI, plus the command-line
//! and environment configuration of the `s3-object` binary.

use crate::{
    errors::ObjectResult,
    models::{
        attributes::{Access, Attributes, Digest, StorageClass},
        metadata::Meta,
    },
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

/// `content_md5` as written in configuration: `true` asks for the digest to
/// be computed at save time, a string is a precomputed hex digest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DigestOption {
    Compute(bool),
    Hex(String),
}

impl DigestOption {
    pub fn into_digest(self) -> ObjectResult<Digest> {
        match self {
            DigestOption::Compute(compute) => Ok(Digest::from(compute)),
            DigestOption::Hex(hex) => Digest::from_hex(&hex),
        }
    }
}

/// Attribute overrides applied to an object at construction.
///
/// Defaults are resolved before an object exists: a bucket merges its own
/// defaults with the caller's options and hands the result to the object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObjectOptions {
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub content_encoding: Option<String>,
    pub cache_control: Option<String>,
    pub expires: Option<String>,
    pub pragma: Option<String>,
    pub content_md5: Option<DigestOption>,
    pub access: Option<Access>,
    pub storage_class: Option<StorageClass>,
    pub sse: Option<String>,
    pub meta: Option<Meta>,
    pub gzip: Option<bool>,
}

impl ObjectOptions {
    /// Field-wise merge; values set in `overrides` win. Metadata maps are
    /// combined, with `overrides` winning per key.
    pub fn merge(mut self, overrides: ObjectOptions) -> Self {
        fn pick<T>(base: &mut Option<T>, over: Option<T>) {
            if over.is_some() {
                *base = over;
            }
        }

        pick(&mut self.content_type, overrides.content_type);
        pick(&mut self.content_disposition, overrides.content_disposition);
        pick(&mut self.content_encoding, overrides.content_encoding);
        pick(&mut self.cache_control, overrides.cache_control);
        pick(&mut self.expires, overrides.expires);
        pick(&mut self.pragma, overrides.pragma);
        pick(&mut self.content_md5, overrides.content_md5);
        pick(&mut self.access, overrides.access);
        pick(&mut self.storage_class, overrides.storage_class);
        pick(&mut self.sse, overrides.sse);
        pick(&mut self.gzip, overrides.gzip);

        self.meta = match (self.meta, overrides.meta) {
            (Some(mut base), Some(over)) => {
                base.extend(&over);
                Some(base)
            }
            (base, over) => over.or(base),
        };
        self
    }

    /// Write every set option into `attributes`.
    pub fn apply(self, attributes: &mut Attributes) -> ObjectResult<()> {
        fn assign<T>(field: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *field = value;
            }
        }

        assign(&mut attributes.content_type, self.content_type);
        assign(&mut attributes.content_disposition, self.content_disposition);
        assign(&mut attributes.content_encoding, self.content_encoding);
        assign(&mut attributes.cache_control, self.cache_control);
        assign(&mut attributes.expires, self.expires);
        assign(&mut attributes.pragma, self.pragma);
        assign(&mut attributes.access, self.access);
        assign(&mut attributes.storage_class, self.storage_class);
        assign(&mut attributes.sse, self.sse);

        if let Some(digest) = self.content_md5 {
            attributes.content_md5 = digest.into_digest()?;
        }
        if let Some(meta) = self.meta {
            attributes.meta.extend(&meta);
        }
        if let Some(gzip) = self.gzip {
            attributes.gzip = gzip;
        }
        Ok(())
    }

    /// Load options from a JSON document.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading defaults file `{}`", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing defaults file `{}`", path.display()))
    }
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Read and write single S3 objects")]
pub struct Cli {
    /// Store endpoint (overrides S3_OBJECT_ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Bucket name (overrides S3_OBJECT_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// JSON file with default object options (overrides S3_OBJECT_DEFAULTS)
    #[arg(long)]
    pub defaults: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload an object
    Put(PutArgs),
    /// Download an object
    Get {
        key: String,
        /// Write the payload here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print an object's attributes as JSON
    Head { key: String },
    /// Exit successfully only if the object exists
    Exists { key: String },
    /// Remove an object
    Delete { key: String },
}

#[derive(Args, Debug)]
pub struct PutArgs {
    pub key: String,

    /// Read the payload from a file
    #[arg(long, conflicts_with = "value")]
    pub file: Option<PathBuf>,

    /// Use this text as the payload
    #[arg(long, required_unless_present = "file")]
    pub value: Option<String>,

    /// Compress the payload with gzip
    #[arg(long)]
    pub gzip: bool,

    /// Send a Content-MD5 integrity header
    #[arg(long)]
    pub md5: bool,

    /// Canned ACL, e.g. public_read
    #[arg(long)]
    pub acl: Option<Access>,

    /// Storage class, e.g. standard_ia
    #[arg(long)]
    pub storage_class: Option<StorageClass>,

    #[arg(long)]
    pub content_type: Option<String>,

    /// User metadata as key=value, repeatable
    #[arg(long = "meta", value_parser = parse_meta_pair)]
    pub meta: Vec<(String, String)>,
}

impl PutArgs {
    /// Options given on the command line; unset flags stay unset.
    pub fn options(&self) -> ObjectOptions {
        ObjectOptions {
            content_type: self.content_type.clone(),
            content_md5: self.md5.then_some(DigestOption::Compute(true)),
            access: self.acl,
            storage_class: self.storage_class,
            meta: (!self.meta.is_empty()).then(|| self.meta.iter().cloned().collect()),
            gzip: self.gzip.then_some(true),
            ..ObjectOptions::default()
        }
    }
}

fn parse_meta_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{}`", raw))
}

/// Resolved CLI configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub endpoint: String,
    pub bucket: String,
    pub defaults: ObjectOptions,
}

impl AppConfig {
    /// Merge parsed arguments over environment variables.
    pub fn from_env_and_args(cli: &Cli) -> Result<Self> {
        // --- Environment fallback ---
        let env_endpoint =
            env::var("S3_OBJECT_ENDPOINT").unwrap_or_else(|_| "http://127.0.0.1:3000".into());
        let env_bucket = env::var("S3_OBJECT_BUCKET").ok();
        let env_defaults = env::var_os("S3_OBJECT_DEFAULTS").map(PathBuf::from);

        // --- Merge ---
        let bucket = cli
            .bucket
            .clone()
            .or(env_bucket)
            .context("no bucket given: pass --bucket or set S3_OBJECT_BUCKET")?;
        let defaults = match cli.defaults.clone().or(env_defaults) {
            Some(path) => ObjectOptions::from_json_file(&path)?,
            None => ObjectOptions::default(),
        };

        Ok(Self {
            endpoint: cli.endpoint.clone().unwrap_or(env_endpoint),
            bucket,
            defaults,
        })
    }
}
