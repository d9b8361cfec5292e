//! Submit a video and follow it until the backend is done with it.
//!
//! ```text
//! cargo run --example watch_job -- <video-url> [audio|video] [base-url] [out-dir]
//! ```

use std::path::PathBuf;

use downtube_client::{ClientConfig, DowntubeClient, JobStatus, MediaKind};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let Some(video_url) = args.next() else {
        eprintln!("usage: watch_job <video-url> [audio|video] [base-url] [out-dir]");
        std::process::exit(2);
    };
    let media_kind = match args.next().as_deref() {
        Some("audio") => MediaKind::Audio,
        _ => MediaKind::Video,
    };
    let base_url = args
        .next()
        .unwrap_or_else(|| ClientConfig::default().base_url);
    let out_dir = args.next().map(PathBuf::from);

    let client = DowntubeClient::new(ClientConfig::with_base_url(base_url))?;

    let job_id = client.submit(&video_url, media_kind).await?;
    println!("job {job_id} submitted");

    let mut status = client.open_status_with_kind(job_id.clone(), media_kind);
    println!("[{}] {}", status.status(), client.view(&status.snapshot()).message);

    while let Some(snapshot) = status.changed().await {
        let view = client.view(&snapshot);
        println!("[{}] {}", snapshot.status, view.message);
        if let Some(link) = &view.retrieval {
            println!("{}: {}", link.label, link.url);
        }
    }

    let last = status.snapshot();
    if last.status == JobStatus::Completed
        && let Some(dir) = out_dir
    {
        let saved = client.artifacts().fetch_to(&job_id, &dir).await?;
        println!("saved to {}", saved.display());
    }

    Ok(())
}
