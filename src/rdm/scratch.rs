use crate::defaults::SCRATCH_PREFIX;
use crate::error::{PropertyError, Result};
use hashbrown::HashSet;
use log::{debug, error};
use ndarray::prelude::*;
use ndarray::{Data, Dimension};
use ndarray_npy::{NpzReader, NpzWriter};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicUsize, Ordering};

static SCRATCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Labels of the blocks of the two-particle density kept in the scratch file.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Rdm2Block {
    Ovov,
    Vvvv,
    Oooo,
    Ovvo,
    Ovvv,
    Ooov,
    /// (T) correction to the ovov block
    TriplesOvov,
    /// (T) correction to the ovvv block
    TriplesOvvv,
    /// (T) correction to the ooov block
    TriplesOoov,
}

impl Rdm2Block {
    pub fn label(&self) -> &'static str {
        match self {
            Rdm2Block::Ovov => "dovov",
            Rdm2Block::Vvvv => "dvvvv",
            Rdm2Block::Oooo => "doooo",
            Rdm2Block::Ovvo => "dovvo",
            Rdm2Block::Ovvv => "dovvv",
            Rdm2Block::Ooov => "dooov",
            Rdm2Block::TriplesOvov => "t3_dovov",
            Rdm2Block::TriplesOvvv => "t3_dovvv",
            Rdm2Block::TriplesOoov => "t3_dooov",
        }
    }
}

enum ScratchState {
    /// nothing was written, no file exists
    Empty,
    Writing(NpzWriter<File>),
    Sealed(Option<NpzReader<File>>),
}

/// Transient key-value store for tensor blocks, backed by one `.npz` file.
///
/// The file is created with the first `put` and removed by `close`, or by
/// `Drop` if the store was never closed. Every block is written once and read
/// back once.
pub struct ScratchStore {
    directory: PathBuf,
    path: Option<PathBuf>,
    state: ScratchState,
    written: HashSet<Rdm2Block>,
    consumed: HashSet<Rdm2Block>,
}

impl ScratchStore {
    pub fn new(directory: &Path) -> Self {
        ScratchStore {
            directory: directory.to_path_buf(),
            path: None,
            state: ScratchState::Empty,
            written: HashSet::new(),
            consumed: HashSet::new(),
        }
    }

    /// Location of the scratch file, `None` as long as nothing was written.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn error(&self, message: String) -> PropertyError {
        PropertyError::Scratch {
            path: self.path.clone().unwrap_or_else(|| self.directory.clone()),
            message,
        }
    }

    fn create_file(&mut self) -> Result<NpzWriter<File>> {
        let name: String = format!(
            "{}-{}-{}.npz",
            SCRATCH_PREFIX,
            process::id(),
            SCRATCH_COUNTER.fetch_add(1, Ordering::SeqCst)
        );
        let path: PathBuf = self.directory.join(name);
        let file: File = File::create(&path).map_err(|err| PropertyError::Scratch {
            path: path.clone(),
            message: err.to_string(),
        })?;
        debug!("scratch file {} created", path.display());
        self.path = Some(path);
        Ok(NpzWriter::new(file))
    }

    pub fn contains(&self, key: Rdm2Block) -> bool {
        self.written.contains(&key)
    }

    /// Write a block. Each key can be written once and only before the store is sealed.
    pub fn put<S, D>(&mut self, key: Rdm2Block, array: &ArrayBase<S, D>) -> Result<()>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        if self.written.contains(&key) {
            return Err(self.error(format!("block {} is written twice", key.label())));
        }
        if let ScratchState::Empty = self.state {
            let writer: NpzWriter<File> = self.create_file()?;
            self.state = ScratchState::Writing(writer);
        }
        let result = match &mut self.state {
            ScratchState::Writing(writer) => writer
                .add_array(key.label(), &array.as_standard_layout())
                .map_err(|err| err.to_string()),
            _ => Err(format!("block {} is written after the store was sealed", key.label())),
        };
        result.map_err(|message| self.error(message))?;
        self.written.insert(key);
        Ok(())
    }

    /// Finish writing. Afterwards blocks can only be read.
    pub fn seal(&mut self) -> Result<()> {
        let state: ScratchState = std::mem::replace(&mut self.state, ScratchState::Sealed(None));
        self.state = match state {
            ScratchState::Empty => ScratchState::Sealed(None),
            ScratchState::Writing(writer) => {
                let mut file: File = writer.finish().map_err(|err| self.error(err.to_string()))?;
                let file: File = reopen(&mut file, self.path.as_deref()).map_err(|err| self.error(err.to_string()))?;
                let reader: NpzReader<File> = NpzReader::new(file).map_err(|err| self.error(err.to_string()))?;
                ScratchState::Sealed(Some(reader))
            }
            sealed => sealed,
        };
        Ok(())
    }

    /// Read a block back. The store is sealed on the first read, every block can be read once.
    pub fn take(&mut self, key: Rdm2Block) -> Result<ArrayD<f64>> {
        if let ScratchState::Writing(_) | ScratchState::Empty = self.state {
            self.seal()?;
        }
        if self.consumed.contains(&key) {
            return Err(self.error(format!("block {} was already read", key.label())));
        }
        if !self.written.contains(&key) {
            return Err(self.error(format!("block {} was never written", key.label())));
        }
        let label: &str = key.label();
        let result: std::result::Result<ArrayD<f64>, String> = match &mut self.state {
            ScratchState::Sealed(Some(reader)) => read_entry(reader, label),
            _ => Err(String::from("no scratch file is open")),
        };
        let array: ArrayD<f64> = result.map_err(|message| self.error(message))?;
        self.consumed.insert(key);
        Ok(array)
    }

    /// `take` with the dimensionality fixed.
    pub fn take_array<D: Dimension>(&mut self, key: Rdm2Block) -> Result<Array<f64, D>> {
        let array: ArrayD<f64> = self.take(key)?;
        array
            .into_dimensionality::<D>()
            .map_err(|err| PropertyError::Shape(format!("{}: {}", key.label(), err)))
    }

    /// Close the store and remove the scratch file. Failing to remove the file is an error.
    pub fn close(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        // the file handles have to be closed before the file is removed
        self.state = ScratchState::Empty;
        match self.path.take() {
            Some(path) => match fs::remove_file(&path) {
                Ok(()) => {
                    debug!("scratch file {} removed", path.display());
                    Ok(())
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(source) => Err(PropertyError::ScratchCleanup { path, source }),
            },
            None => Ok(()),
        }
    }
}

impl Drop for ScratchStore {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            error!("{}", err);
        }
    }
}

fn reopen(file: &mut File, path: Option<&Path>) -> io::Result<File> {
    file.sync_all()?;
    match path {
        Some(path) => File::open(path),
        None => Err(io::Error::new(io::ErrorKind::NotFound, "scratch file has no path")),
    }
}

fn read_entry(reader: &mut NpzReader<File>, label: &str) -> std::result::Result<ArrayD<f64>, String> {
    let names: Vec<String> = reader.names().map_err(|err| err.to_string())?;
    let entry: &String = names
        .iter()
        .find(|name| name.as_str() == label || name.trim_end_matches(".npy") == label)
        .ok_or_else(|| format!("block {} is missing in the scratch file", label))?;
    reader.by_name(entry).map_err(|err| err.to_string())
}

/// Run `f` with a fresh scratch store in `directory`. The store is closed when `f`
/// returns, also if it fails. If both `f` and the cleanup fail, the error of `f` is
/// returned and the cleanup error is logged.
pub fn with_scratch<T, F>(directory: &Path, f: F) -> Result<T>
where
    F: FnOnce(&mut ScratchStore) -> Result<T>,
{
    let mut store: ScratchStore = ScratchStore::new(directory);
    let result: Result<T> = f(&mut store);
    let cleanup: Result<()> = store.close();
    match (result, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) => Err(err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(cleanup_err)) => {
            error!("{}", cleanup_err);
            Err(err)
        }
    }
}
