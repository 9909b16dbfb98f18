use std::collections::BTreeMap;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use genhash::{
    build_index, build_index_from_path, pack_fasta, IndexConfig, IndexPaths, IndexReader, Policy,
    Result, SequenceView, OFFSETS_FILE, POSTINGS_FILE, TABLE_LENGTH,
};
use rand::{rngs::SmallRng, Rng, SeedableRng};

/// Random packed reference with no zero bytes, so no window is ever skipped
fn random_reference(rng: &mut SmallRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| rng.random_range(1..=255u8)).collect()
}

/// Base `n` of a packed buffer
fn base(bytes: &[u8], n: usize) -> u32 {
    u32::from((bytes[n / 4] >> (2 * (n % 4))) & 0x3)
}

/// Brute-force index: walks every base position and applies the padding rule
fn naive_index(bytes: &[u8]) -> BTreeMap<u32, Vec<u32>> {
    let mut index = BTreeMap::<u32, Vec<u32>>::new();
    if bytes.len() < 25 {
        return index;
    }
    for i in 0..=bytes.len() - 25 {
        for j in 0..4 {
            let p = 4 * i + j;
            let mut key = 0u32;
            for byte in 0..3 {
                let mut value = 0u32;
                for b in 0..4 {
                    value |= base(bytes, p + 4 * byte + b) << (2 * b);
                }
                key = (key << 8) | value;
            }
            let padding = key == 0 && bytes[i + 4..i + 24].iter().all(|&b| b == 0);
            if !padding {
                index.entry(key).or_default().push(p as u32);
            }
        }
    }
    index
}

fn build(dir: &Path, bytes: &[u8], config: IndexConfig) -> Result<IndexReader> {
    let view = SequenceView::new(bytes)?;
    build_index(&view, &config.output_dir(dir))?;
    IndexReader::open_dir(dir)
}

fn assert_matches_naive(reader: &IndexReader, bytes: &[u8]) -> Result<()> {
    let expected = naive_index(bytes);
    let total: usize = expected.values().map(Vec::len).sum();
    assert_eq!(reader.total_postings(), total);
    for (&key, positions) in &expected {
        assert_eq!(reader.positions(key)?, positions.as_slice(), "key {key:#x}");
    }
    Ok(())
}

#[test]
fn test_random_reference_matches_naive() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut rng = SmallRng::seed_from_u64(7);
    let bytes = random_reference(&mut rng, 2000);

    let reader = build(dir.path(), &bytes, IndexConfig::default())?;
    reader.validate()?;
    assert_matches_naive(&reader, &bytes)?;
    Ok(())
}

#[test]
fn test_coverage() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut rng = SmallRng::seed_from_u64(11);
    let bytes = random_reference(&mut rng, 517);

    let reader = build(dir.path(), &bytes, IndexConfig::default())?;
    assert_eq!(reader.total_postings(), 4 * (bytes.len() - 24));

    // every base position is represented exactly once
    let mut seen = reader.postings()?.to_vec();
    seen.sort_unstable();
    let all: Vec<u32> = (0..(4 * (bytes.len() - 24)) as u32).collect();
    assert_eq!(seen, all);
    Ok(())
}

#[test]
fn test_offsets_and_counts_are_consistent() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut rng = SmallRng::seed_from_u64(13);
    let bytes = random_reference(&mut rng, 800);

    let reader = build(dir.path(), &bytes, IndexConfig::default())?;
    let offsets = reader.offsets()?;
    assert_eq!(offsets.len(), TABLE_LENGTH as usize);
    assert_eq!(offsets[0], 0);
    assert!(offsets.windows(2).all(|w| w[0] <= w[1]));

    let expected = naive_index(&bytes);
    for k in 0..TABLE_LENGTH - 1 {
        let delta = (offsets[k as usize + 1] - offsets[k as usize]) as usize;
        assert_eq!(delta, expected.get(&k).map_or(0, Vec::len), "key {k:#x}");
    }
    Ok(())
}

#[test]
fn test_postings_ascend_within_keys() -> Result<()> {
    let dir = tempfile::tempdir()?;
    // a short repeat makes every key occur many times
    let bytes = [0x1b, 0xe4, 0x93].repeat(120);

    let reader = build(dir.path(), &bytes, IndexConfig::default())?;
    reader.validate()?;
    let mut groups = 0;
    for key in 0..TABLE_LENGTH {
        let positions = reader.positions(key)?;
        if positions.len() > 1 {
            groups += 1;
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }
    assert!(groups > 0);
    assert_matches_naive(&reader, &bytes)?;
    Ok(())
}

#[test]
fn test_deterministic_across_runs_and_block_counts() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(17);
    let bytes = random_reference(&mut rng, 600);

    let mut outputs = Vec::new();
    for blocks in [8, 8, 1, 64] {
        let dir = tempfile::tempdir()?;
        build(dir.path(), &bytes, IndexConfig::default().num_blocks(blocks))?;
        outputs.push((
            fs::read(dir.path().join(OFFSETS_FILE))?,
            fs::read(dir.path().join(POSTINGS_FILE))?,
        ));
    }
    for output in &outputs[1..] {
        assert!(output == &outputs[0]);
    }
    Ok(())
}

#[test]
fn test_all_zero_input() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let reader = build(dir.path(), &[0u8; 26], IndexConfig::default())?;
    assert_eq!(reader.total_postings(), 0);
    assert!(reader.offsets()?.iter().all(|&o| o == 0));
    assert_eq!(fs::metadata(dir.path().join(POSTINGS_FILE))?.len(), 0);
    Ok(())
}

#[test]
fn test_single_live_byte() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut bytes = [0u8; 26];
    bytes[0] = 0b0000_0001;

    let reader = build(dir.path(), &bytes, IndexConfig::default())?;
    assert_eq!(reader.postings()?, &[0]);
    let key = 0x01_00_00u32;
    let offsets = reader.offsets()?;
    assert_eq!(offsets[key as usize + 1] - offsets[key as usize], 1);
    assert_eq!(reader.positions(key)?, &[0]);
    Ok(())
}

#[test]
fn test_padding_region_is_skipped() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut rng = SmallRng::seed_from_u64(19);
    // live sequence, a long padding run, live sequence
    let mut bytes = random_reference(&mut rng, 100);
    bytes.extend(std::iter::repeat(0u8).take(60));
    bytes.extend(random_reference(&mut rng, 100));

    let reader = build(dir.path(), &bytes, IndexConfig::default())?;
    let expected = naive_index(&bytes);
    assert!(reader.total_postings() < 4 * (bytes.len() - 24));

    // window starting at byte 120 lies fully inside the padding run
    let zero_positions = reader.positions(0)?;
    assert!(!zero_positions.contains(&(4 * 120)));
    assert_eq!(zero_positions, expected.get(&0).map_or(&[][..], Vec::as_slice));
    assert_matches_naive(&reader, &bytes)?;
    Ok(())
}

#[test]
fn test_short_inputs() -> Result<()> {
    for len in [0, 1, 24] {
        let dir = tempfile::tempdir()?;
        let reader = build(dir.path(), &vec![0xff; len], IndexConfig::default())?;
        assert_eq!(reader.total_postings(), 0);
        assert_eq!(reader.offsets()?.len(), TABLE_LENGTH as usize);
        assert!(reader.offsets()?.iter().all(|&o| o == 0));
    }
    Ok(())
}

#[test]
fn test_terminator() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut rng = SmallRng::seed_from_u64(23);
    let bytes = random_reference(&mut rng, 300);

    let reader = build(dir.path(), &bytes, IndexConfig::default().terminator(true))?;
    assert!(reader.has_terminator());
    let offsets = reader.offsets()?;
    assert_eq!(offsets.len(), TABLE_LENGTH as usize + 1);
    assert_eq!(offsets[TABLE_LENGTH as usize] as usize, reader.total_postings());
    assert_matches_naive(&reader, &bytes)?;
    Ok(())
}

#[test]
fn test_rebuild_truncates_previous_output() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut rng = SmallRng::seed_from_u64(29);
    let large = random_reference(&mut rng, 900);
    let small = random_reference(&mut rng, 40);

    build(dir.path(), &large, IndexConfig::default())?;
    let reader = build(dir.path(), &small, IndexConfig::default())?;
    assert_eq!(reader.total_postings(), 4 * (small.len() - 24));
    assert_eq!(reader.offsets()?.len(), TABLE_LENGTH as usize);
    Ok(())
}

#[test]
fn test_fasta_to_index() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut rng = SmallRng::seed_from_u64(31);
    let mut fasta = b">chr1\n".to_vec();
    for _ in 0..12 {
        let line: Vec<u8> = (0..60).map(|_| b"ACGT"[rng.random_range(0..4)]).collect();
        fasta.extend_from_slice(&line);
        fasta.push(b'\n');
    }
    fasta.extend_from_slice(b">chr2\nNNNNNNNNNNNNNNNNNNNNNNNNNNNNNNNNNNNNNNNN\nacgtacgtacgt\n");

    let reference = dir.path().join("reference.bin");
    let bases = pack_fasta(
        Cursor::new(fasta),
        fs::File::create(&reference)?,
        Policy::default(),
    )?;
    assert_eq!(bases, 12 * 60 + 40 + 12);

    let out = dir.path().join("index");
    fs::create_dir(&out)?;
    let config = IndexConfig::default().output_dir(&out).num_blocks(4);
    let summary = build_index_from_path(&reference, &config)?;

    let reader = IndexReader::open(&IndexPaths::in_dir(&out))?;
    assert_eq!(summary.total_postings as usize, reader.total_postings());
    reader.validate()?;
    assert_matches_naive(&reader, &fs::read(&reference)?)?;
    Ok(())
}
