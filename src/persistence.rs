//! Engine snapshots: a versioned binary image of a built engine.
//!
//! The runtime structures are flattened into plain `Vec`-based rkyv structs:
//! groups carry their post-softmax weights (re-applying softmax on load would
//! change every score), pools list their buckets with tokens sorted
//! lexicographically so the byte stream is canonical, and the source table is
//! stored column-major-labelled row lists. Derived lookups (bucket dedup
//! maps, header inversions) are rebuilt on load rather than stored.
//!
//! Saving a loaded engine again reproduces the exact same bytes, and a
//! loaded engine answers queries identically to the one that was saved.

use bytes::Bytes;
use indexmap::IndexMap;
use rkyv::rancor::Error as RkyvError;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Archived, Deserialize as RkyvDeserialize, Serialize as RkyvSerialize};

use crate::backbone::{group_block::GroupBlock, Backbone, Side};
use crate::error::{Error, Result};
use crate::index::{Bucket, Pool, Posting};
use crate::matching::engine::FuzzyDatabase;
use crate::profile::ScoringProfile;
use crate::table::{Dataframe, Row};
use crate::utils::file_io;

/// Current snapshot format version. Bump on any layout change.
pub const ENGINE_FORMAT_VERSION: u32 = 1;

/// Default snapshot file name inside the operating directory.
pub const ENGINE_FILE_NAME: &str = "fuzzy_engine.rkyv";

#[derive(Archive, RkyvSerialize, RkyvDeserialize, Debug)]
pub struct EngineSnapshot {
    pub version: u32,
    pub name: String,
    pub profile: ProfileFlat,
    pub backbone: BackboneFlat,
    pub pools: Vec<PoolFlat>,
    pub table: TableFlat,
}

/// Scoring profile with list fields widened to fixed-size integers.
#[derive(Archive, RkyvSerialize, RkyvDeserialize, Debug)]
pub struct ProfileFlat {
    pub length_scale: f64,
    pub length_shift: f64,
    pub length_margin: f64,
    pub bucket_scale: f64,
    pub bucket_offset: f64,
    pub cut_sizes: Vec<u32>,
    pub ngram_windows: Vec<u32>,
    pub long_input_len: u32,
    pub medium_input_len: u32,
    pub long_sentinel_repeat: u32,
    pub medium_sentinel_repeat: u32,
    pub numeric_id_repeat: u32,
}

#[derive(Archive, RkyvSerialize, RkyvDeserialize, Debug)]
pub struct BackboneFlat {
    pub reference_key: Option<String>,
    pub target_key: Option<String>,
    pub reference_groups: Vec<GroupFlat>,
    pub target_groups: Vec<GroupFlat>,
    pub ref_to_tgt: Vec<LinkFlat>,
    pub tgt_to_ref: Vec<LinkFlat>,
}

/// One group with post-softmax weights, parallel to its headers.
#[derive(Archive, RkyvSerialize, RkyvDeserialize, Debug)]
pub struct GroupFlat {
    pub name: String,
    pub headers: Vec<String>,
    pub weights: Vec<f64>,
}

#[derive(Archive, RkyvSerialize, RkyvDeserialize, Debug)]
pub struct LinkFlat {
    pub source: String,
    pub targets: Vec<String>,
}

#[derive(Archive, RkyvSerialize, RkyvDeserialize, Debug)]
pub struct PoolFlat {
    pub group: String,
    pub buckets: Vec<BucketFlat>,
}

#[derive(Archive, RkyvSerialize, RkyvDeserialize, Debug)]
pub struct BucketFlat {
    pub token: String,
    pub postings: Vec<PostingFlat>,
}

#[derive(Archive, RkyvSerialize, RkyvDeserialize, Debug)]
pub struct PostingFlat {
    pub row: u64,
    pub weight: f64,
}

/// Source table as column labels plus label-aligned value rows.
#[derive(Archive, RkyvSerialize, RkyvDeserialize, Debug)]
pub struct TableFlat {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Flattens a built engine into its snapshot form.
pub fn snapshot_engine(engine: &FuzzyDatabase) -> EngineSnapshot {
    let backbone = engine.backbone();

    let flatten_groups = |side: Side| -> Vec<GroupFlat> {
        backbone
            .groups(side)
            .values()
            .map(|block| {
                let (headers, weights) = block
                    .header_weights()
                    .map(|(h, w)| (h.to_string(), w))
                    .unzip();
                GroupFlat {
                    name: block.name().to_string(),
                    headers,
                    weights,
                }
            })
            .collect()
    };

    let flatten_links = |left_to_right: bool| -> Vec<LinkFlat> {
        backbone
            .links(left_to_right)
            .iter()
            .map(|(source, targets)| LinkFlat {
                source: source.clone(),
                targets: targets.clone(),
            })
            .collect()
    };

    let pools = engine
        .pools()
        .iter()
        .map(|(group, pool)| {
            let mut buckets: Vec<BucketFlat> = pool
                .iter()
                .map(|(token, bucket)| BucketFlat {
                    token: token.to_string(),
                    postings: bucket
                        .entries()
                        .iter()
                        .map(|posting| PostingFlat {
                            row: posting.index as u64,
                            weight: posting.weight,
                        })
                        .collect(),
                })
                .collect();
            buckets.sort_by(|a, b| a.token.cmp(&b.token));
            PoolFlat {
                group: group.clone(),
                buckets,
            }
        })
        .collect();

    let source = engine.source();
    let table = TableFlat {
        columns: source.columns().to_vec(),
        rows: source
            .iter()
            .map(|row| {
                source
                    .columns()
                    .iter()
                    .map(|column| row.get(column).cloned().unwrap_or_default())
                    .collect()
            })
            .collect(),
    };

    let profile = engine.profile();
    EngineSnapshot {
        version: ENGINE_FORMAT_VERSION,
        name: engine.name().to_string(),
        profile: ProfileFlat {
            length_scale: profile.length_scale,
            length_shift: profile.length_shift,
            length_margin: profile.length_margin,
            bucket_scale: profile.bucket_scale,
            bucket_offset: profile.bucket_offset,
            cut_sizes: profile.cut_sizes.iter().map(|&c| c as u32).collect(),
            ngram_windows: profile.ngram_windows.iter().map(|&w| w as u32).collect(),
            long_input_len: profile.long_input_len as u32,
            medium_input_len: profile.medium_input_len as u32,
            long_sentinel_repeat: profile.long_sentinel_repeat as u32,
            medium_sentinel_repeat: profile.medium_sentinel_repeat as u32,
            numeric_id_repeat: profile.numeric_id_repeat as u32,
        },
        backbone: BackboneFlat {
            reference_key: backbone.reference_key_header().map(str::to_string),
            target_key: backbone.target_key_header().map(str::to_string),
            reference_groups: flatten_groups(Side::Reference),
            target_groups: flatten_groups(Side::Target),
            ref_to_tgt: flatten_links(true),
            tgt_to_ref: flatten_links(false),
        },
        pools,
        table,
    }
}

/// Serializes a built engine to its canonical byte form.
pub fn engine_to_bytes(engine: &FuzzyDatabase) -> Result<Vec<u8>> {
    let snapshot = snapshot_engine(engine);
    let bytes = rkyv::to_bytes::<RkyvError>(&snapshot)
        .map_err(|e| Error::Persistence(format!("cannot serialize engine snapshot: {e}")))?;
    Ok(bytes.to_vec())
}

/// Reconstructs an engine from snapshot bytes, validating the format
/// version.
pub fn engine_from_bytes(bytes: &[u8]) -> Result<FuzzyDatabase> {
    // rkyv requires aligned input; incoming buffers (files, network) carry
    // no alignment guarantee.
    let mut aligned = AlignedVec::<16>::new();
    aligned.extend_from_slice(bytes);

    let archived: &Archived<EngineSnapshot> = rkyv::access(&aligned)
        .map_err(|e: RkyvError| Error::Persistence(format!("corrupt engine snapshot: {e}")))?;

    let version = archived.version.to_native();
    if version != ENGINE_FORMAT_VERSION {
        return Err(Error::Persistence(format!(
            "snapshot version {version} does not match supported version {ENGINE_FORMAT_VERSION}"
        )));
    }

    let profile = ScoringProfile {
        length_scale: archived.profile.length_scale.to_native(),
        length_shift: archived.profile.length_shift.to_native(),
        length_margin: archived.profile.length_margin.to_native(),
        bucket_scale: archived.profile.bucket_scale.to_native(),
        bucket_offset: archived.profile.bucket_offset.to_native(),
        cut_sizes: archived
            .profile
            .cut_sizes
            .iter()
            .map(|c| c.to_native() as usize)
            .collect(),
        ngram_windows: archived
            .profile
            .ngram_windows
            .iter()
            .map(|w| w.to_native() as usize)
            .collect(),
        long_input_len: archived.profile.long_input_len.to_native() as usize,
        medium_input_len: archived.profile.medium_input_len.to_native() as usize,
        long_sentinel_repeat: archived.profile.long_sentinel_repeat.to_native() as usize,
        medium_sentinel_repeat: archived.profile.medium_sentinel_repeat.to_native() as usize,
        numeric_id_repeat: archived.profile.numeric_id_repeat.to_native() as usize,
    };

    let restore_groups = |groups: &Archived<Vec<GroupFlat>>| -> IndexMap<String, GroupBlock> {
        groups
            .iter()
            .map(|group| {
                let block = GroupBlock::from_normalized(
                    group.name.to_string(),
                    group.headers.iter().map(|h| h.to_string()).collect(),
                    group.weights.iter().map(|w| w.to_native()).collect(),
                );
                (group.name.to_string(), block)
            })
            .collect()
    };

    let restore_links = |links: &Archived<Vec<LinkFlat>>| -> IndexMap<String, Vec<String>> {
        links
            .iter()
            .map(|link| {
                (
                    link.source.to_string(),
                    link.targets.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect()
    };

    let backbone = Backbone::from_parts(
        restore_groups(&archived.backbone.reference_groups),
        restore_groups(&archived.backbone.target_groups),
        restore_links(&archived.backbone.ref_to_tgt),
        restore_links(&archived.backbone.tgt_to_ref),
        archived.backbone.reference_key.as_ref().map(|k| k.to_string()),
        archived.backbone.target_key.as_ref().map(|k| k.to_string()),
    );

    let mut pools: IndexMap<String, Pool> = IndexMap::new();
    for pool_flat in archived.pools.iter() {
        let mut pool = Pool::new();
        for bucket_flat in pool_flat.buckets.iter() {
            let postings: Vec<Posting> = bucket_flat
                .postings
                .iter()
                .map(|posting| Posting {
                    index: posting.row.to_native() as usize,
                    weight: posting.weight.to_native(),
                })
                .collect();
            pool.insert_bucket(bucket_flat.token.to_string(), Bucket::from_postings(postings));
        }
        pools.insert(pool_flat.group.to_string(), pool);
    }

    let columns: Vec<String> = archived.table.columns.iter().map(|c| c.to_string()).collect();
    let rows: Vec<Row> = archived
        .table
        .rows
        .iter()
        .map(|values| {
            columns
                .iter()
                .cloned()
                .zip(values.iter().map(|v| v.to_string()))
                .collect()
        })
        .collect();
    let table = Dataframe::from_rows(columns, rows);

    Ok(FuzzyDatabase::from_parts(
        archived.name.to_string(),
        backbone,
        pools,
        table,
        profile,
    ))
}

/// Writes an engine snapshot to a local path, `s3://` URI, or `memory://`
/// test path.
pub async fn save_engine(engine: &FuzzyDatabase, path: &str) -> Result<()> {
    let bytes = engine_to_bytes(engine)?;
    file_io::write_bytes(path, Bytes::from(bytes))
        .await
        .map_err(|e| Error::Persistence(format!("cannot write snapshot '{path}': {e}")))
}

/// Loads an engine snapshot saved with [`save_engine`].
pub async fn load_engine(path: &str) -> Result<FuzzyDatabase> {
    let bytes = file_io::read_bytes(path)
        .await
        .map_err(|e| Error::Persistence(format!("cannot read snapshot '{path}': {e}")))?;
    engine_from_bytes(&bytes)
}
