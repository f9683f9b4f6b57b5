//! One-shot job command.

use super::GenerateArgs;
use std::sync::Arc;
use storybooker::{JobRegistry, JobRequest, JobStatus, Services, StorybookerConfig};

fn request(args: GenerateArgs) -> JobRequest {
    JobRequest {
        theme: args.theme,
        num_pages: args.pages,
        style: args.style,
        languages: args.languages,
        pinned_character_ids: args.characters,
        text_provider: args.text_provider,
        image_provider: args.image_provider,
    }
}

/// Run one job in this process, printing progress until it finishes.
pub async fn run_generate(config: &StorybookerConfig, args: GenerateArgs) -> anyhow::Result<()> {
    let services = Services::from_config(config, |key| std::env::var(key).ok())?;
    let registry = JobRegistry::new(Arc::new(services));

    let id = registry.submit(request(args)).await?;
    println!("Job {}", id);

    let mut rx = registry
        .subscribe(id)
        .await
        .ok_or_else(|| anyhow::anyhow!("job {} disappeared", id))?;
    let mut last_step = String::new();
    let snapshot = loop {
        let snapshot = rx.borrow_and_update().clone();
        if snapshot.current_step != last_step {
            println!("[{:>3}%] {}", snapshot.progress, snapshot.current_step);
            last_step = snapshot.current_step.clone();
        }
        if snapshot.status.is_terminal() {
            break snapshot;
        }
        if rx.changed().await.is_err() {
            break rx.borrow().clone();
        }
    };

    for degraded in &snapshot.degraded {
        println!("Missing {}: {}", degraded.asset, degraded.reason);
    }

    match snapshot.status {
        JobStatus::Completed => {
            for (language, document) in &snapshot.outputs_by_language {
                println!("{}: {}", language, document.path.display());
            }
            Ok(())
        }
        _ => match snapshot.error_detail {
            Some(detail) => anyhow::bail!(
                "job failed during {}: {} ({})",
                detail.phase,
                detail.message,
                detail.diagnostic
            ),
            None => anyhow::bail!("job ended as {}", snapshot.status),
        },
    }
}
