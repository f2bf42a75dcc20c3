//! CLI command implementations.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use marr::{Generic, MultiArray, SnapshotError, SnapshotHeader};

/// A three-component vector of any storable scalar.
#[derive(Clone, Copy, Debug, PartialEq, Generic)]
pub struct Vec3<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

/// A labelled point in space.
#[derive(Clone, Copy, Debug, PartialEq, Generic)]
pub struct Zone {
    pub id: i64,
    pub position: Vec3<f32>,
}

impl Zone {
    /// The zone shifted by the given offsets.
    pub fn moved(self, dx: f32, dy: f32, dz: f32) -> Zone {
        Zone {
            id: self.id,
            position: Vec3 {
                x: self.position.x + dx,
                y: self.position.y + dy,
                z: self.position.z + dz,
            },
        }
    }
}

/// Deterministic zone for index `i`.
#[allow(
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    reason = "demo data only needs to be deterministic"
)]
pub fn zone(i: usize) -> Zone {
    Zone {
        id: i as i64,
        position: Vec3 {
            x: i as f32,
            y: (i % 97) as f32 * 0.5,
            z: -1.0,
        },
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    Usage(String),

    #[error("failed to read {path}: {source}", path = path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}", path = path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Vec and MultiArray results differ at index {0}")]
    Mismatch(usize),
}

/// Number of zones when `--count` is not given.
const DEFAULT_COUNT: usize = 100_000;

/// Options of the `zones` command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZonesOptions {
    pub count: usize,
    pub steps: usize,
}

impl Default for ZonesOptions {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            steps: 10,
        }
    }
}

impl ZonesOptions {
    /// Parse `--count N` and `--steps S` (also as `--count=N`).
    pub fn parse(args: &[String]) -> Result<Self, CommandError> {
        let mut options = Self::default();
        parse_numeric_flags(
            args,
            &mut [
                (&["--count", "-n"][..], &mut options.count),
                (&["--steps", "-s"][..], &mut options.steps),
            ],
        )?;
        Ok(options)
    }
}

/// Options of the `snapshot-zones` command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapshotOptions {
    pub count: usize,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
        }
    }
}

impl SnapshotOptions {
    /// Parse `--count N` (also as `--count=N`).
    pub fn parse(args: &[String]) -> Result<Self, CommandError> {
        let mut options = Self::default();
        parse_numeric_flags(args, &mut [(&["--count", "-n"][..], &mut options.count)])?;
        Ok(options)
    }
}

/// Assign each `--flag N` / `--flag=N` in `args` to its slot; anything not
/// listed in `flags` is a usage error.
fn parse_numeric_flags(
    args: &[String],
    flags: &mut [(&[&str], &mut usize)],
) -> Result<(), CommandError> {
    let mut args = args.iter();
    while let Some(arg) = args.next() {
        let (name, inline) = match arg.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (arg.as_str(), None),
        };
        let Some((_, slot)) = flags.iter_mut().find(|(names, _)| names.contains(&name)) else {
            return Err(CommandError::Usage(format!("unknown option `{arg}`")));
        };
        let value = inline
            .or_else(|| args.next().cloned())
            .ok_or_else(|| CommandError::Usage(format!("`{name}` needs a value")))?;
        **slot = value.parse().map_err(|_| {
            CommandError::Usage(format!("`{name}` expects a number, got `{value}`"))
        })?;
    }
    Ok(())
}

/// Timings of one `zones` run.
#[derive(Debug)]
pub struct ZonesReport {
    pub options: ZonesOptions,
    pub vec_time: Duration,
    pub multiarray_time: Duration,
}

impl fmt::Display for ZonesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "moved {} zones {} times",
            self.options.count, self.options.steps
        )?;
        writeln!(f, "  Vec:        {:?}", self.vec_time)?;
        write!(f, "  MultiArray: {:?}", self.multiarray_time)
    }
}

/// Move every zone `steps` times, once through `Vec::map`-style iteration
/// and once through [`MultiArray::map`], and check the results agree.
pub fn run_zones(options: &ZonesOptions) -> Result<ZonesReport, CommandError> {
    let mut zones: Vec<Zone> = (0..options.count).map(zone).collect();
    let mut array: MultiArray<Zone> = MultiArray::from_fn(options.count, zone);

    let start = Instant::now();
    for _ in 0..options.steps {
        zones = zones.into_iter().map(|z| z.moved(1.0, 0.0, 0.0)).collect();
    }
    let vec_time = start.elapsed();

    let start = Instant::now();
    for _ in 0..options.steps {
        array = array.map(|z| z.moved(1.0, 0.0, 0.0));
    }
    let multiarray_time = start.elapsed();

    if let Some(index) = zones
        .iter()
        .zip(array.iter())
        .position(|(expected, actual)| *expected != actual)
    {
        return Err(CommandError::Mismatch(index));
    }

    Ok(ZonesReport {
        options: *options,
        vec_time,
        multiarray_time,
    })
}

/// Write a snapshot of `count` deterministic zones, returning its size.
pub fn snapshot_zones(path: impl AsRef<Path>, count: usize) -> Result<usize, CommandError> {
    let path = path.as_ref();
    let bytes = MultiArray::from_fn(count, zone).encode_snapshot();
    std::fs::write(path, &bytes).map_err(|source| CommandError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(bytes.len())
}

/// Describe a snapshot's header and type.
pub fn inspect(bytes: &[u8]) -> Result<String, SnapshotError> {
    let header = SnapshotHeader::parse(bytes)?;
    Ok(format!(
        "version: {}\ncount: {}\ntype: {}\ndescriptor bytes: {}\npayload bytes: {}\n",
        header.version,
        header.count,
        header.type_desc,
        header.type_desc.encoded_len(),
        header.payload_len,
    ))
}

/// Read and describe the snapshot at `path`.
pub fn inspect_file(path: impl AsRef<Path>) -> Result<String, CommandError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| CommandError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(inspect(&bytes)?)
}
