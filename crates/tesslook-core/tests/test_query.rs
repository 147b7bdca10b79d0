#[allow(dead_code)]
mod common;

use common::{FakeService, ALPHA_CEN};
use tesslook_core::error::TessError;
use tesslook_core::query::{CutoutQueryClient, CutoutRequest, SectorFetch, SelectionPolicy};
use tesslook_core::target::{IcrsCoord, ResolvedTarget};

fn position_request(sector: Option<u32>, size: u32) -> CutoutRequest {
    CutoutRequest {
        target: ResolvedTarget::Position(IcrsCoord {
            ra: ALPHA_CEN.0,
            dec: ALPHA_CEN.1,
        }),
        sector,
        size,
    }
}

// ---------------------------------------------------------------------------
// Direct-mode query
// ---------------------------------------------------------------------------

#[test]
fn test_query_sector_3_alpha_centauri() {
    let work = tempfile::tempdir().unwrap();
    let service = FakeService::with_sectors(&[3, 9, 10])
        .cutout(3, 100, "alf Cen")
        .cutout(9, 100, "alf Cen");
    let client = CutoutQueryClient::new(&service, work.path());

    let archives = client
        .query(&position_request(Some(3), 100), SelectionPolicy::First)
        .unwrap();
    assert_eq!(archives.len(), 1);
    assert_eq!(archives[0].sector, 3);
    assert_eq!(archives[0].camera, Some(1));
    assert!(archives[0].path.is_file());
    assert_eq!(service.downloads.borrow().as_slice(), &[(3, 100)]);
}

#[test]
fn test_query_no_coverage_is_empty() {
    let work = tempfile::tempdir().unwrap();
    let service = FakeService::with_sectors(&[]);
    let client = CutoutQueryClient::new(&service, work.path());

    let archives = client
        .query(&position_request(None, 100), SelectionPolicy::All)
        .unwrap();
    assert!(archives.is_empty());
    assert!(service.downloaded_sectors().is_empty());
}

#[test]
fn test_query_sector_filter_without_match_is_empty() {
    let work = tempfile::tempdir().unwrap();
    let service = FakeService::with_sectors(&[9, 10]).cutout(9, 100, "x");
    let client = CutoutQueryClient::new(&service, work.path());

    let archives = client
        .query(&position_request(Some(3), 100), SelectionPolicy::First)
        .unwrap();
    assert!(archives.is_empty());
}

#[test]
fn test_query_policies() {
    let work = tempfile::tempdir().unwrap();
    let service = FakeService::with_sectors(&[9, 38, 11])
        .cutout(9, 10, "x")
        .cutout(38, 10, "x")
        .cutout(11, 10, "x");
    let client = CutoutQueryClient::new(&service, work.path());
    let request = position_request(None, 10);

    let first = client.query(&request, SelectionPolicy::First).unwrap();
    assert_eq!(first.iter().map(|a| a.sector).collect::<Vec<_>>(), vec![9]);

    let best = client.query(&request, SelectionPolicy::Best).unwrap();
    assert_eq!(best.iter().map(|a| a.sector).collect::<Vec<_>>(), vec![38]);

    let all = client.query(&request, SelectionPolicy::All).unwrap();
    assert_eq!(
        all.iter().map(|a| a.sector).collect::<Vec<_>>(),
        vec![9, 38, 11]
    );
}

#[test]
fn test_query_dedupes_sectors() {
    let work = tempfile::tempdir().unwrap();
    let mut service = FakeService::with_sectors(&[3]).cutout(3, 10, "x");
    let mut other_ccd = common::sector_info(3);
    other_ccd.ccd = 3;
    service.sectors.push(other_ccd);
    let client = CutoutQueryClient::new(&service, work.path());

    let all = client
        .query(&position_request(None, 10), SelectionPolicy::All)
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].ccd, Some(2));
}

#[test]
fn test_query_rejected_by_service() {
    let work = tempfile::tempdir().unwrap();
    let service = FakeService {
        reject: Some("Dec must be between -90 and 90".into()),
        ..FakeService::with_sectors(&[3])
    };
    let client = CutoutQueryClient::new(&service, work.path());

    let err = client
        .query(&position_request(Some(3), 100), SelectionPolicy::First)
        .unwrap_err();
    match err {
        TessError::QueryRejected(msg) => assert!(msg.contains("Dec must be")),
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_query_rejects_invalid_size_before_network() {
    let work = tempfile::tempdir().unwrap();
    let service = FakeService::with_sectors(&[3]).cutout(3, 10, "x");
    let client = CutoutQueryClient::new(&service, work.path());

    for size in [0, 5000] {
        let err = client
            .query(&position_request(Some(3), size), SelectionPolicy::First)
            .unwrap_err();
        assert!(matches!(err, TessError::QueryRejected(_)));
    }
    assert!(service.downloaded_sectors().is_empty());
}

#[test]
fn test_query_unresolvable_name() {
    let work = tempfile::tempdir().unwrap();
    let service = FakeService::with_sectors(&[3]);
    let client = CutoutQueryClient::new(&service, work.path());
    let request = CutoutRequest {
        target: ResolvedTarget::Identifier("no such star".into()),
        sector: None,
        size: 10,
    };

    let err = client.query(&request, SelectionPolicy::First).unwrap_err();
    assert!(matches!(err, TessError::QueryRejected(_)));
}

#[test]
fn test_query_download_failure_is_fatal() {
    let work = tempfile::tempdir().unwrap();
    let service = FakeService {
        failing: vec![3],
        ..FakeService::with_sectors(&[3])
    };
    let client = CutoutQueryClient::new(&service, work.path());

    let err = client
        .query(&position_request(Some(3), 10), SelectionPolicy::First)
        .unwrap_err();
    assert!(matches!(err, TessError::Service(_)));
}

// ---------------------------------------------------------------------------
// Search mode
// ---------------------------------------------------------------------------

#[test]
fn test_search_and_fetch_every_sector() {
    let work = tempfile::tempdir().unwrap();
    let service = FakeService::with_sectors(&[11, 12])
        .name("TIC 261868510", ALPHA_CEN.0, ALPHA_CEN.1)
        .cutout(11, 20, "TIC 261868510")
        .cutout(12, 20, "TIC 261868510");
    let client = CutoutQueryClient::new(&service, work.path());

    let products = client.search_and_fetch("TIC 261868510", 20).unwrap();
    assert_eq!(products.len(), 2);
    for (product, sector) in products.iter().zip([11, 12]) {
        assert_eq!(product.sector, sector);
        let handle = match product.product.as_ref().unwrap() {
            SectorFetch::Product(handle) => handle,
            other => panic!("expected a product, got {other:?}"),
        };
        assert_eq!(handle.sector, sector);
        assert!(handle
            .path
            .starts_with(work.path().join(format!("tess_cutout_sector{sector}"))));
        assert!(handle.path.is_file());
    }
}

#[test]
fn test_search_without_coverage() {
    let work = tempfile::tempdir().unwrap();
    let service = FakeService::with_sectors(&[]).name("TIC 1", 10.0, 10.0);
    let client = CutoutQueryClient::new(&service, work.path());

    assert!(client.search_and_fetch("TIC 1", 20).unwrap().is_empty());
}

#[test]
fn test_search_sector_failure_is_isolated() {
    let work = tempfile::tempdir().unwrap();
    let service = FakeService {
        failing: vec![11],
        ..FakeService::with_sectors(&[11, 12])
            .name("TIC 1", 10.0, 10.0)
            .cutout(12, 20, "TIC 1")
    };
    let client = CutoutQueryClient::new(&service, work.path());

    let products = client.search_and_fetch("TIC 1", 20).unwrap();
    assert!(matches!(products[0].product, Err(TessError::Service(_))));
    assert!(products[1].product.is_ok());
}

#[test]
fn test_search_archive_without_fits() {
    let work = tempfile::tempdir().unwrap();
    let service = FakeService::with_sectors(&[11])
        .name("TIC 1", 10.0, 10.0)
        .archive(11, common::zip_bytes(&[("log.txt", b"empty".to_vec())]));
    let client = CutoutQueryClient::new(&service, work.path());

    let products = client.search_and_fetch("TIC 1", 20).unwrap();
    match &products[0].product {
        Ok(SectorFetch::NoFrameFiles { dir }) => {
            assert_eq!(dir, &work.path().join("tess_cutout_sector11"));
            assert!(dir.join("log.txt").is_file());
        }
        other => panic!("expected an empty extraction, got {other:?}"),
    }
}
