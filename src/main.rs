use anyhow::{Context, Result, bail};
use bytes::Bytes;
use clap::Parser;
use s3_object::{
    Bucket, HttpConnection,
    config::{AppConfig, Cli, Command, PutArgs},
};
use serde_json::json;
use std::{
    fs,
    io::{self, Write},
    process::ExitCode,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    // --- Parse config ---
    let cli = Cli::parse();
    let cfg = AppConfig::from_env_and_args(&cli)?;
    tracing::debug!("Resolved config: {:?}", cfg);

    // --- Connect ---
    let connection = HttpConnection::new(&cfg.endpoint, cfg.bucket.clone())
        .with_context(|| format!("connecting to {}", cfg.endpoint))?;
    let bucket = Bucket::new(connection, cfg.defaults);

    match cli.command {
        Command::Put(args) => put(&bucket, args).await?,
        Command::Get { key, output } => {
            let object = bucket.fetch(&key).await?;
            let Some(value) = object.value() else {
                bail!("object `{}` not found", key);
            };
            match output {
                Some(path) => fs::write(&path, value)
                    .with_context(|| format!("writing `{}`", path.display()))?,
                None => io::stdout().write_all(value)?,
            }
        }
        Command::Head { key } => {
            let mut object = bucket.object(&key)?;
            object.head().await?;
            let status = object.response().map(|r| r.status.as_u16());
            if status != Some(200) {
                bail!("object `{}` not found (status {:?})", key, status);
            }
            let attrs = &object.attributes;
            let report = json!({
                "key": object.key(),
                "content_type": attrs.content_type,
                "content_disposition": attrs.content_disposition,
                "content_encoding": attrs.content_encoding,
                "cache_control": attrs.cache_control,
                "expires": attrs.expires,
                "pragma": attrs.pragma,
                "storage_class": attrs.storage_class,
                "sse": attrs.sse,
                "meta": attrs.meta,
                "remote": object.remote(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Exists { key } => {
            if !bucket.exists(&key).await? {
                tracing::info!("{} does not exist", key);
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Delete { key } => {
            if !bucket.delete(&key).await? {
                bail!("delete of `{}` was not acknowledged", key);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn put(bucket: &Bucket<HttpConnection>, args: PutArgs) -> Result<()> {
    let value = match (&args.file, &args.value) {
        (Some(path), _) => {
            Bytes::from(fs::read(path).with_context(|| format!("reading `{}`", path.display()))?)
        }
        (None, Some(text)) => Bytes::from(text.clone()),
        (None, None) => bail!("nothing to upload: pass --file or --value"),
    };

    let mut object = bucket.object_with(&args.key, Some(value), args.options())?;
    if !object.save().await? {
        match object.error() {
            Some(error) => bail!("upload of `{}` rejected: {}", object.key(), error),
            None => bail!("upload of `{}` rejected", object.key()),
        }
    }

    tracing::info!("Stored {} ({} bytes)", object, object.size());
    Ok(())
}
