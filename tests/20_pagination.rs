//! Pagination contract as seen from the outside: raw query values in,
//! envelope metadata out.

use grupos_api::pagination::{PageParams, Paginated};

#[test]
fn defaults_apply_when_nothing_is_sent() {
    let p = PageParams::resolve(None, None);
    assert_eq!(p.page, 1);
    assert_eq!(p.limit, 6);
    assert_eq!(p.offset(), 0);
}

#[test]
fn garbage_input_never_errors() {
    for (page, limit) in [("", ""), ("abc", "xyz"), ("-1", "0"), ("1e3", "2.5")] {
        let p = PageParams::resolve(Some(page), Some(limit));
        assert!(p.page >= 1);
        assert!((1..=100).contains(&p.limit));
    }
}

#[test]
fn oversized_limits_clamp_instead_of_failing() {
    let p = PageParams::resolve(Some("1"), Some("100000"));
    assert_eq!(p.limit, 100);
}

#[test]
fn offset_follows_page_and_limit() {
    let p = PageParams::resolve(Some("4"), Some("25"));
    assert_eq!(p.offset(), 75);
}

#[test]
fn seven_items_at_limit_two_make_four_pages() {
    let params = PageParams::resolve(Some("1"), Some("2"));
    let page = Paginated::new(vec!["a", "b"], 7, params);
    assert_eq!(page.pagination.total_items, 7);
    assert_eq!(page.pagination.total_pages, 4);
    assert_eq!(page.pagination.current_page, 1);
    assert_eq!(page.pagination.limit, 2);
}

#[test]
fn three_items_at_limit_two_span_two_pages() {
    let params = PageParams::resolve(Some("1"), Some("2"));
    let page = Paginated::new(vec!["g1", "g2"], 3, params);
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.pagination.total_items, 3);
    assert_eq!(page.pagination.total_pages, 2);
}

#[test]
fn empty_result_reports_zero_pages() {
    let params = PageParams::resolve(Some("3"), Some("10"));
    let page: Paginated<i32> = Paginated::new(Vec::new(), 0, params);
    assert_eq!(page.pagination.total_items, 0);
    assert_eq!(page.pagination.total_pages, 0);
    // The requested page is echoed even past the end of the data.
    assert_eq!(page.pagination.current_page, 3);
}

#[test]
fn envelope_uses_camel_case_wire_keys() {
    let params = PageParams::resolve(None, None);
    let page = Paginated::new(vec![1], 1, params);
    let v = serde_json::to_value(&page).unwrap();

    assert!(v.get("data").is_some());
    let pagination = v.get("pagination").unwrap();
    for key in ["totalItems", "totalPages", "currentPage", "limit"] {
        assert!(pagination.get(key).is_some(), "missing key {key}");
    }
}
