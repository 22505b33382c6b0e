use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

/// Checkpoint the movie embeddings were generated with. Query vectors must
/// come from the same model or distances are meaningless.
const MODEL_REPO: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";

/// (remote path, local filename) pairs the embedder needs on disk.
const MODEL_FILES: &[(&str, &str)] = &[
    ("onnx/model.onnx", "model.onnx"),
    ("tokenizer.json", "tokenizer.json"),
];

pub fn model_dir(base_dir: &Path) -> PathBuf {
    base_dir.join("models").join("all-MiniLM-L6-v2")
}

pub fn is_model_downloaded(base_dir: &Path) -> bool {
    let dir = model_dir(base_dir);
    MODEL_FILES.iter().all(|(_, name)| dir.join(name).exists())
}

/// Fetches the model files on first use and returns the model directory.
pub fn ensure_model(base_dir: &Path) -> Result<PathBuf> {
    let dir = model_dir(base_dir);

    if is_model_downloaded(base_dir) {
        log::debug!("Model already present at {:?}", dir);
        return Ok(dir);
    }

    eprintln!("Fetching embedding model all-MiniLM-L6-v2 (~80MB, one time only)...\n");
    fs::create_dir_all(&dir).context("Failed to create model directory")?;

    for (remote, name) in MODEL_FILES {
        let dest = dir.join(name);
        if dest.exists() {
            log::debug!("{} already exists, skipping", name);
            continue;
        }
        fetch(&format!("{MODEL_REPO}/{remote}"), &dest, name)
            .with_context(|| format!("Failed to fetch {name}"))?;
    }

    eprintln!("\nModel ready at {}\n", dir.display());
    Ok(dir)
}

/// Streams one file to disk, drawing a progress bar when the server
/// announces a length.
fn fetch(url: &str, dest: &Path, name: &str) -> Result<()> {
    let response = ureq::get(url).call().with_context(|| format!("GET {url}"))?;

    let total = response
        .header("content-length")
        .and_then(|v| v.parse::<u64>().ok());
    let bar = progress_bar(name, total);

    let mut reader = bar.wrap_read(response.into_reader());
    let mut file =
        fs::File::create(dest).with_context(|| format!("Failed to create file {:?}", dest))?;
    std::io::copy(&mut reader, &mut file).context("Download interrupted")?;

    bar.finish();
    Ok(())
}

fn progress_bar(name: &str, total: Option<u64>) -> ProgressBar {
    match total {
        Some(len) => {
            let bar = ProgressBar::new(len);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("  {msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .expect("Invalid progress bar template")
                    .progress_chars("=> "),
            );
            bar.set_message(name.to_string());
            bar
        }
        None => ProgressBar::new_spinner().with_message(format!("Downloading {name}...")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_files_are_exactly_what_the_embedder_loads() {
        let names: Vec<&str> = MODEL_FILES.iter().map(|(_, name)| *name).collect();
        assert_eq!(names, ["model.onnx", "tokenizer.json"]);
    }

    #[test]
    fn test_is_model_downloaded_requires_every_file() {
        let base = tempfile::tempdir().unwrap();
        assert!(!is_model_downloaded(base.path()));

        let dir = model_dir(base.path());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("model.onnx"), b"onnx").unwrap();
        assert!(!is_model_downloaded(base.path()));

        fs::write(dir.join("tokenizer.json"), b"{}").unwrap();
        assert!(is_model_downloaded(base.path()));
    }
}
