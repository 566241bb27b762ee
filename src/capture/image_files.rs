use super::{Frame, FrameSource};
use anyhow::{Context, Result};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// Reads still images (PNG, JPEG, ...) from a list of paths, in order
pub struct ImageFileSource {
    queue: VecDeque<(PathBuf, String)>,
}

impl ImageFileSource {
    pub fn new<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let paths: Vec<PathBuf> = paths
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect();
        let names = frame_names(&paths)?;
        tracing::info!("Queued {} input images", paths.len());
        Ok(Self {
            queue: paths.into_iter().zip(names).collect(),
        })
    }

    /// Decode one image file into a frame called `name`
    pub fn load(path: &Path, name: String) -> Result<Frame> {
        let image = image::open(path)
            .with_context(|| format!("Failed to decode image {}", path.display()))?
            .to_rgb8();
        Ok(Frame { name, image })
    }
}

impl FrameSource for ImageFileSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        match self.queue.pop_front() {
            Some((path, name)) => Self::load(&path, name).map(Some),
            None => Ok(None),
        }
    }

    fn remaining(&self) -> Option<usize> {
        Some(self.queue.len())
    }
}

/// One frame name per input, taken from the file name.
///
/// Inputs from different directories can share a file name; later ones get
/// a `_2`, `_3`, ... suffix before the extension so no two frames end up
/// with the same output file.
pub fn frame_names(paths: &[PathBuf]) -> Result<Vec<String>> {
    let mut used = HashSet::new();
    let mut names = Vec::with_capacity(paths.len());
    for path in paths {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("Input path {} has no file name", path.display()))?;

        let mut name = file_name.clone();
        if used.contains(&name) {
            let as_path = Path::new(&file_name);
            let stem = as_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let ext = as_path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default();
            let mut n = 2;
            while used.contains(&name) {
                name = format!("{stem}_{n}{ext}");
                n += 1;
            }
            tracing::warn!(
                "{} shares its file name with an earlier input, writing it as {}",
                path.display(),
                name
            );
        }
        used.insert(name.clone());
        names.push(name);
    }
    Ok(names)
}
