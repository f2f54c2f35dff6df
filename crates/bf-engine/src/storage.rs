//! Direction-indexed filter storage
//!
//! Loads every impulse response named by the filter list at startup,
//! transforms them to partitioned spectra once, and answers
//! nearest-neighbour direction queries from a 2-D KD-tree per population.
//! Loading is all-or-nothing: a missing file or malformed entry aborts
//! startup, so the query paths never fail — a lookup that somehow misses
//! the map returns the population's silent default filter with a warning.

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use bf_core::Pose;
use bf_dsp::{BlockFft, Filter, IrFilter};
use bf_file::{FilterListEntry, parse_filter_list, read_ir};
use kdtree::KdTree;
use kdtree::distance::squared_euclidean;

use crate::{EngineConfig, EngineError, EngineResult};

/// One family of direction-indexed filters (directional, late-reverb, or
/// directivity): the key → filter map, the coordinate list, and the KD-tree
/// over those coordinates.
struct Population {
    name: &'static str,
    filters: HashMap<String, Filter>,
    coords: Vec<[f32; 2]>,
    tree: KdTree<f32, usize, [f32; 2]>,
    default: Filter,
}

impl Population {
    fn new(name: &'static str, default: Filter) -> Self {
        Self {
            name,
            filters: HashMap::new(),
            coords: Vec::new(),
            tree: KdTree::new(2),
            default,
        }
    }

    fn insert(&mut self, pose: Pose, filter: Filter) -> EngineResult<()> {
        let key = pose.key();
        if self.filters.insert(key.clone(), filter).is_some() {
            log::warn!("{}: duplicate filter entry for key {key}, keeping the last", self.name);
        }

        let coord = [pose.azimuth() as f32, pose.elevation() as f32];
        let index = self.coords.len();
        self.coords.push(coord);
        self.tree
            .add(coord, index)
            .map_err(|e| EngineError::Config(format!("{}: KD-tree insert failed: {e}", self.name)))?;
        Ok(())
    }

    fn len(&self) -> usize {
        self.filters.len()
    }

    fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Nearest filter for a pose. Reconstructs the canonical key from the
    /// matched coordinate with zero auxiliary fields; a map miss (a latent
    /// bug, e.g. an entry keyed with non-zero auxiliary fields) falls back
    /// to the silent default.
    fn nearest(&self, pose: &Pose) -> &Filter {
        let query = [pose.azimuth() as f32, pose.elevation() as f32];
        let found = match self.tree.nearest(&query, 1, &squared_euclidean) {
            Ok(found) => found,
            Err(e) => {
                log::warn!("{}: KD-tree query failed: {e}", self.name);
                return &self.default;
            }
        };

        let Some(&(_, &index)) = found.first() else {
            log::warn!("{}: no filters indexed, using silent default", self.name);
            return &self.default;
        };

        let coord = self.coords[index];
        let key = Pose::from_direction(coord[0] as i32, coord[1] as i32).key();
        match self.filters.get(&key) {
            Some(filter) => {
                log::debug!("{}: filter found for key {key}", self.name);
                filter
            }
            None => {
                log::warn!("{}: filter not found for key {key}, using silent default", self.name);
                &self.default
            }
        }
    }
}

/// All filters the engine can select from, loaded and prepared at startup.
pub struct FilterStore {
    directional: Population,
    late_reverb: Option<Population>,
    directivity: Option<Population>,
    headphone: Option<Filter>,
}

impl FilterStore {
    /// Load and prepare every filter named by the configured filter list.
    pub fn load(config: &EngineConfig) -> EngineResult<Self> {
        log::info!("FilterStore: loading {}", config.filter_list.display());
        let start = Instant::now();

        let entries = parse_filter_list(&config.filter_list)?;
        let block_size = config.block_size;
        let mut fft = BlockFft::new(block_size);

        let mut directional = Population::new(
            "directional",
            Filter::zeros(config.filter_size, block_size),
        );
        let mut late_reverb = config.use_splitted_filters.then(|| {
            Population::new(
                "late-reverb",
                Filter::zeros(config.late_reverb_size, block_size),
            )
        });
        let mut directivity = (config.directivity_size > 0).then(|| {
            Population::new(
                "directivity",
                Filter::zeros(config.directivity_size, block_size),
            )
        });
        let mut headphone = None;

        for entry in entries {
            match entry {
                FilterListEntry::Headphone { path } => {
                    if config.use_headphone_filter {
                        log::info!("Loading headphone filter: {}", path.display());
                        headphone = Some(load_filter(
                            &path,
                            config.headphone_filter_size,
                            block_size,
                            config.sampling_rate,
                            &mut fft,
                        )?);
                    } else {
                        log::info!("Skipping headphone filter: {}", path.display());
                    }
                }
                FilterListEntry::Directional { pose, path } => {
                    let filter = load_filter(
                        &path,
                        config.filter_size,
                        block_size,
                        config.sampling_rate,
                        &mut fft,
                    )?;
                    directional.insert(pose, filter)?;
                }
                FilterListEntry::LateReverb { pose, path } => match late_reverb.as_mut() {
                    Some(population) => {
                        log::info!("Loading late reverb filter: {}", path.display());
                        let filter = load_filter(
                            &path,
                            config.late_reverb_size,
                            block_size,
                            config.sampling_rate,
                            &mut fft,
                        )?;
                        population.insert(pose, filter)?;
                    }
                    None => log::info!("Skipping late reverb filter: {}", path.display()),
                },
                FilterListEntry::Directivity { pose, path } => match directivity.as_mut() {
                    Some(population) => {
                        let filter = load_filter(
                            &path,
                            config.directivity_size,
                            block_size,
                            config.sampling_rate,
                            &mut fft,
                        )?;
                        population.insert(pose, filter)?;
                    }
                    None => log::info!("Skipping directivity filter: {}", path.display()),
                },
            }
        }

        if directional.is_empty() {
            return Err(EngineError::Config(
                "filter list contains no directional FILTER entries".into(),
            ));
        }
        if let Some(population) = &late_reverb {
            if population.is_empty() {
                return Err(EngineError::Config(
                    "useSplittedFilters is on but the filter list has no LATEREVERB entries".into(),
                ));
            }
        }
        if let Some(population) = &directivity {
            if population.is_empty() {
                return Err(EngineError::Config(
                    "directivitySize is set but the filter list has no DIRECTIVITY entries".into(),
                ));
            }
        }
        if config.use_headphone_filter && headphone.is_none() {
            return Err(EngineError::Config(
                "useHeadphoneFilter is on but the filter list has no HPFILTER entry".into(),
            ));
        }

        log::info!(
            "FilterStore: loaded {} directional, {} late-reverb, {} directivity filters in {:.2?}",
            directional.len(),
            late_reverb.as_ref().map_or(0, Population::len),
            directivity.as_ref().map_or(0, Population::len),
            start.elapsed()
        );

        Ok(Self {
            directional,
            late_reverb,
            directivity,
            headphone,
        })
    }

    /// Nearest directional filter; never fails after a successful load.
    pub fn nearest_directional(&self, pose: &Pose) -> &Filter {
        self.directional.nearest(pose)
    }

    /// Nearest late-reverb tail, when split filtering is enabled.
    pub fn nearest_late_reverb(&self, pose: &Pose) -> Option<&Filter> {
        self.late_reverb.as_ref().map(|p| p.nearest(pose))
    }

    /// Nearest directivity filter, when directivity filtering is enabled.
    pub fn nearest_directivity(&self, pose: &Pose) -> Option<&Filter> {
        self.directivity.as_ref().map(|p| p.nearest(pose))
    }

    /// The headphone compensation filter, when enabled.
    pub fn headphone(&self) -> Option<&Filter> {
        self.headphone.as_ref()
    }

    pub fn directional_count(&self) -> usize {
        self.directional.len()
    }
}

fn load_filter(
    path: &Path,
    target_frames: usize,
    block_size: usize,
    sampling_rate: u32,
    fft: &mut BlockFft,
) -> EngineResult<Filter> {
    log::debug!("Loading {}", path.display());
    let mut ir = read_ir(path)?;
    if ir.sample_rate != sampling_rate {
        log::warn!(
            "{}: sample rate {} does not match configured {}",
            path.display(),
            ir.sample_rate,
            sampling_rate
        );
    }
    ir.fit_length(target_frames, &path.display().to_string());
    let filter = IrFilter::from_interleaved(&ir.samples, block_size)?.prepare(fft)?;
    Ok(filter)
}
