use pretty_assertions::assert_eq;
use recordkit_query::{paginate, Page, QueryError};

#[test]
fn rejects_zero_and_negative() {
    for (number, size) in [(0, 10), (1, 0), (-1, 5), (3, -2)] {
        assert!(matches!(
            Page::new(number, size),
            Err(QueryError::InvalidPage { number: n, size: s }) if n == number && s == size
        ));
    }
}

#[test]
fn skip_is_number_minus_one_times_size() {
    let page = Page::new(3, 4).unwrap();
    assert_eq!(page.skip(), 8);
    assert_eq!(page.number(), 3);
    assert_eq!(page.size(), 4);
}

#[test]
fn second_page_of_five() {
    let page = Page::new(2, 2).unwrap();
    assert_eq!(paginate(vec![1, 2, 3, 4, 5], page), vec![3, 4]);
    assert_eq!(page.window(5), 2..4);
}

#[test]
fn last_partial_page() {
    assert_eq!(paginate(vec![1, 2, 3, 4, 5], Page::new(3, 2).unwrap()), vec![5]);
}

#[test]
fn past_the_end_is_empty() {
    let page = Page::new(4, 2).unwrap();
    assert!(paginate(vec![1, 2, 3, 4, 5], page).is_empty());
    assert_eq!(page.window(5), 5..5);
}

#[test]
fn huge_page_number_saturates() {
    let page = Page::new(i64::MAX, i64::MAX).unwrap();
    assert!(paginate(vec![1, 2, 3], page).is_empty());
}
