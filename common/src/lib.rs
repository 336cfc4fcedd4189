use std::path::Path;

use anyhow::Result;
use futures::stream::StreamExt;
use reqwest::{Client, IntoUrl};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Stream the body of `url` into `path`, creating parent directories as needed.
///
/// The file is written to a `.part` sibling first and renamed once the body is complete, so an
/// interrupted download never leaves a truncated file under the final name.
pub async fn streamed_download(
    client: &Client,
    url: impl IntoUrl,
    path: impl AsRef<Path>,
) -> Result<u64> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let resp = client.get(url).send().await?.error_for_status()?;

    let mut part = path.as_os_str().to_owned();
    part.push(".part");
    let mut file = fs::File::create(&part).await?;
    let mut written = 0;
    let mut stream = resp.bytes_stream();
    while let Some(b) = stream.next().await {
        let chunk = b?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    fs::rename(&part, path).await?;

    Ok(written)
}
