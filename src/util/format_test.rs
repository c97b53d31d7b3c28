use super::*;

#[test]
fn group_thousands_inserts_separators() {
    assert_eq!(group_thousands(0), "0");
    assert_eq!(group_thousands(999), "999");
    assert_eq!(group_thousands(1_000), "1,000");
    assert_eq!(group_thousands(120_000), "120,000");
    assert_eq!(group_thousands(1_234_567), "1,234,567");
}

#[test]
fn salary_range_variants() {
    assert_eq!(format_salary(None, None), "Salary not specified");
    assert_eq!(format_salary(Some(80_000), Some(120_000)), "$80,000 - $120,000");
    assert_eq!(format_salary(Some(50_000), None), "From $50,000");
    assert_eq!(format_salary(None, Some(90_000)), "Up to $90,000");
}

#[test]
fn zero_bounds_count_as_unset() {
    assert_eq!(format_salary(Some(0), Some(0)), "Salary not specified");
    assert_eq!(format_salary(Some(0), Some(70_000)), "Up to $70,000");
}
