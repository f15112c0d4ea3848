use super::*;

// -----------------------------------------------------------------------
// identity and labels
// -----------------------------------------------------------------------

#[test]
fn restaurant_key_folds_case_and_whitespace() {
    assert_eq!(restaurant_key("  Bistro   A "), "bistro a");
    assert_eq!(restaurant_key("BISTRO A"), restaurant_key("bistro a"));
}

#[test]
fn normalize_label_capitalises_words() {
    assert_eq!(normalize_label("new  YORK"), "New York");
    assert_eq!(normalize_label(" thai "), "Thai");
    assert_eq!(normalize_label(""), "");
}

// -----------------------------------------------------------------------
// rating
// -----------------------------------------------------------------------

#[test]
fn parse_rating_accepts_bounds() {
    assert_eq!(parse_rating("0").unwrap(), 0.0);
    assert_eq!(parse_rating(" 5.0 ").unwrap(), 5.0);
    assert_eq!(parse_rating("4.5").unwrap(), 4.5);
}

#[test]
fn parse_rating_rejects_blank_text_and_out_of_range() {
    assert!(parse_rating("").is_err());
    assert!(parse_rating("great").is_err());
    assert!(parse_rating("5.5").is_err());
    assert!(parse_rating("-1").is_err());
    assert!(parse_rating("NaN").is_err());
}

// -----------------------------------------------------------------------
// delivery time
// -----------------------------------------------------------------------

#[test]
fn parse_minutes_blank_is_absent() {
    assert_eq!(parse_minutes("  ").unwrap(), None);
}

#[test]
fn parse_minutes_accepts_units() {
    assert_eq!(parse_minutes("30").unwrap(), Some(30.0));
    assert_eq!(parse_minutes("30 min").unwrap(), Some(30.0));
    assert_eq!(parse_minutes("25.5mins").unwrap(), Some(25.5));
    assert_eq!(parse_minutes("45 Minutes").unwrap(), Some(45.0));
}

#[test]
fn parse_minutes_resolves_ranges_to_midpoint() {
    assert_eq!(parse_minutes("30-40 minutes").unwrap(), Some(35.0));
    assert_eq!(parse_minutes("20 \u{2013} 30").unwrap(), Some(25.0));
}

#[test]
fn parse_minutes_rejects_garbage_and_reversed_ranges() {
    assert!(parse_minutes("soon").is_err());
    assert!(parse_minutes("-5").is_err());
    assert!(parse_minutes("40-30").is_err());
}

// -----------------------------------------------------------------------
// price
// -----------------------------------------------------------------------

#[test]
fn parse_price_strips_currency_and_separators() {
    assert_eq!(parse_price("$12.50").unwrap(), Some(12.5));
    assert_eq!(parse_price("\u{20ac} 1,200").unwrap(), Some(1200.0));
    assert_eq!(parse_price("").unwrap(), None);
}

#[test]
fn parse_price_rejects_negative_and_text() {
    assert!(parse_price("-3").is_err());
    assert!(parse_price("cheap").is_err());
}

// -----------------------------------------------------------------------
// menu items
// -----------------------------------------------------------------------

#[test]
fn split_menu_items_handles_delimiters() {
    assert_eq!(
        split_menu_items("Pad Thai; Green Curry | Spring Rolls,Mango Rice"),
        vec!["Pad Thai", "Green Curry", "Spring Rolls", "Mango Rice"]
    );
}

#[test]
fn split_menu_items_handles_list_literals() {
    assert_eq!(
        split_menu_items(r#"["Pad Thai", 'Spring  Rolls']"#),
        vec!["Pad Thai", "Spring Rolls"]
    );
}

#[test]
fn split_menu_items_drops_blanks() {
    assert!(split_menu_items(" , ;; ").is_empty());
    assert!(split_menu_items("[]").is_empty());
}
