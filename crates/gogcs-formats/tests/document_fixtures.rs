//! Integration tests for repository, manifest and chunklist documents
//!
//! Generation-2 fixtures are stored inflated and compressed at test time the
//! same way the meta endpoint serves them.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::io::Write;
use std::path::Path;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use gogcs_formats::chunklist::{ChunkList, ChunklistError};
use gogcs_formats::v1::{DepotManifestV1, RepositoryV1};
use gogcs_formats::v2::{DepotManifestV2, RepositoryV2};
use gogcs_formats::{FileFlags, ManifestError, Os};
use pretty_assertions::assert_eq;

fn fixtures_dir() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures")
        .leak()
}

fn read_fixture(name: &str) -> Vec<u8> {
    let path = fixtures_dir().join(name);
    std::fs::read(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e))
}

fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("Operation should succeed");
    encoder.finish().expect("Operation should succeed")
}

// --- Generation 1 ---

const V1_URL: &str = "https://cdn.gog.com/content-system/v1/manifests/1207664643/windows/37794096/repository.json";

#[test]
fn v1_repository_splits_depots_and_redistributables() {
    let repo = RepositoryV1::parse(&read_fixture("v1/repository.json"), V1_URL)
        .expect("V1 repository parse should succeed");

    assert_eq!(repo.depots.len(), 2);
    assert_eq!(repo.redistributables.len(), 1);
    assert_eq!(repo.redistributables[0].executable, "__redist/MSVC2010/vcredist_x86.exe");
    assert_eq!(repo.products.len(), 2);
    assert_eq!(repo.products[1].dependency, "1207664643");
    assert!(repo.depots.iter().all(|d| d.url == V1_URL));
    assert_eq!(repo.depots[0].languages, vec!["en-US"]);
    assert_eq!(repo.depots[1].languages, vec!["*"]);
    assert_eq!(repo.depots[0].os(), Some(&Os::Windows));
    assert_eq!(
        repo.depots[0].manifest_id().unwrap(),
        "3d1c0a0c-0f7e-4a3f-9d91-7a2c2f8f0a5e"
    );
    assert_eq!(
        repo.depots[0].manifest_url(),
        "https://cdn.gog.com/content-system/v1/manifests/1207664643/windows/37794096/3d1c0a0c-0f7e-4a3f-9d91-7a2c2f8f0a5e.json"
    );
}

#[test]
fn v1_manifest_classifies_items() {
    let manifest = DepotManifestV1::parse(&read_fixture("v1/depot_manifest.json"))
        .expect("V1 manifest parse should succeed");

    assert_eq!(manifest.files.len(), 3);
    assert_eq!(manifest.directories.len(), 1);
    assert_eq!(manifest.links.len(), 1);
    assert_eq!(manifest.links[0].target, "lib64");
    assert_eq!(manifest.files[0].flags, FileFlags::EXECUTABLE);
    assert_eq!(manifest.files[1].offset, Some(18353152));
    assert!(manifest.files[2].flags.contains(FileFlags::SUPPORT));
    assert_eq!(manifest.files[2].checksum, None);
}

#[test]
fn v1_parsers_reject_generation_two_documents() {
    let repo = read_fixture("v2/repository.json");
    assert!(matches!(
        RepositoryV1::parse(&repo, V1_URL),
        Err(ManifestError::SchemaMismatch {
            expected: 1,
            found: 2
        })
    ));

    let manifest = read_fixture("v2/depot_manifest.json");
    assert!(matches!(
        DepotManifestV1::parse(&manifest),
        Err(ManifestError::SchemaMismatch { .. })
    ));
}

// --- Generation 2 ---

#[test]
fn v2_repository_from_compressed_bytes() {
    let compressed = deflate(&read_fixture("v2/repository.json"));
    let repo = RepositoryV2::parse_compressed(&compressed)
        .expect("V2 repository parse should succeed");

    assert_eq!(repo.platform, Os::Windows);
    assert_eq!(repo.depots.len(), 3);
    assert_eq!(repo.depots[1].os_bitness.as_deref().map(<[String]>::len), Some(2));
    assert!(repo.depots[1].is_gog_depot);
    assert_eq!(repo.products[0].script, None);
    assert_eq!(
        repo.offline_depot().map(|d| d.manifest_id.as_str()),
        Some("e5a8b0a0f7b44e0d8a4c9dbe7b1dd3a2")
    );
}

#[test]
fn v2_manifest_from_compressed_bytes() {
    let compressed = deflate(&read_fixture("v2/depot_manifest.json"));
    let manifest = DepotManifestV2::parse_compressed(&compressed)
        .expect("V2 manifest parse should succeed");

    assert_eq!(manifest.files.len(), 3);
    assert_eq!(manifest.directories.len(), 1);
    assert_eq!(manifest.links.len(), 1);
    assert_eq!(manifest.links[0].target, "System/witcher.exe");

    let exe = &manifest.files[0];
    assert_eq!(exe.checksum(), Some("d41d8cd98f00b204e9800998ecf8427e"));
    assert_eq!(exe.size(), 12582912);
    assert!(exe.file_flags().contains(FileFlags::EXECUTABLE));

    let bif = &manifest.files[1];
    assert_eq!(bif.checksum(), Some("f9e8d7c6b5a49382716059e4d3c2b1a0"));

    let readme = &manifest.files[2];
    assert!(readme.is_in_container());
    assert_eq!(readme.sfc_ref.map(|r| r.size), Some(900));

    let container = manifest
        .small_files_container
        .as_ref()
        .expect("Container should be present");
    assert_eq!(container.path, "");
    assert_eq!(container.size(), 1000);
}

#[test]
fn v2_manifest_deduplicates_chunks() {
    let manifest = DepotManifestV2::parse(&read_fixture("v2/depot_manifest.json"))
        .expect("V2 manifest parse should succeed");

    let keys: Vec<_> = manifest
        .unique_chunks()
        .into_iter()
        .map(|c| c.compressed_md5.clone())
        .collect();
    assert_eq!(
        keys,
        vec![
            "0a1b2c3d4e5f60718293a4b5c6d7e8f9",
            "1a2b3c4d5e6f708192a3b4c5d6e7f809",
            "4d5e6f708192a3b4c5d6e7f8091a2b3c",
        ]
    );
    assert_eq!(manifest.total_size(), 23069572);
    assert_eq!(manifest.download_size(), 7340632);
}

#[test]
fn v2_manifest_rejects_generation_one_version() {
    let data = br#"{"version": 1, "depot": {"items": []}}"#;
    assert!(matches!(
        DepotManifestV2::parse(data),
        Err(ManifestError::SchemaMismatch {
            expected: 2,
            found: 1
        })
    ));
}

#[test]
fn v2_manifest_rejects_unknown_item_type() {
    let data = br#"{"version": 2, "depot": {"items": [
        {"type": "DepotDirectory", "path": "a"},
        {"type": "DepotFoo", "path": "b"}
    ]}}"#;
    match DepotManifestV2::parse(data) {
        Err(ManifestError::UnknownItemType(kind)) => assert_eq!(kind, "DepotFoo"),
        other => panic!("Expected unknown item type, got {other:?}"),
    }
}

#[test]
fn v2_manifest_rejects_corrupt_compression() {
    assert!(matches!(
        DepotManifestV2::parse_compressed(b"\x78\x9cnot zlib"),
        Err(ManifestError::Decompress(_))
    ));
}

// --- Legacy chunklists ---

#[test]
fn chunklist_fixture_covers_file() {
    let xml = String::from_utf8(read_fixture("chunklist/setup.xml")).expect("Fixture is UTF-8");
    let list = ChunkList::parse(&xml).expect("Chunklist parse should succeed");

    assert_eq!(list.chunks.len(), 3);
    assert!(list.available);
    assert_eq!(list.chunks[2].len(), 4194304);
    list.validate(25165824).expect("Chunks should cover the file");
    assert!(matches!(
        list.validate(25165825),
        Err(ChunklistError::CoverageMismatch { .. })
    ));
}

#[test]
fn chunklist_gap_is_detected() {
    let xml = r#"<file name="a.exe" available="1" notavailablemsg="" md5="" timestamp="2017-01-23 15:20:48">
        <chunk id="0" from="0" to="50" method="md5">00</chunk>
        <chunk id="1" from="60" to="100" method="md5">11</chunk>
    </file>"#;
    let list = ChunkList::parse(xml).expect("Chunklist parse should succeed");
    assert!(matches!(
        list.validate(100),
        Err(ChunklistError::Gap {
            id: 1,
            expected: 50,
            found: 60
        })
    ));
}
