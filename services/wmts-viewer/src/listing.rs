//! Console listing of the layers a service offers.

use wmts_protocol::Capabilities;

pub const LISTING_HEADER: &str = "Available layers:";

/// Header line followed by one identifier per line, sorted, indented by
/// four spaces.
pub fn layer_listing(caps: &Capabilities) -> String {
    format_listing(caps.layer_names())
}

pub fn format_listing<'a, I>(names: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut sorted: Vec<&str> = names.into_iter().collect();
    sorted.sort_unstable();

    let mut out = String::from(LISTING_HEADER);
    for name in sorted {
        out.push_str("\n    ");
        out.push_str(name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::capabilities_with_layers;

    #[test]
    fn test_listing_sorted_and_indented() {
        let caps = Capabilities::parse(&capabilities_with_layers(&["A", "C", "B"])).unwrap();
        assert_eq!(layer_listing(&caps), "Available layers:\n    A\n    B\n    C");
    }

    #[test]
    fn test_empty_listing() {
        assert_eq!(format_listing(Vec::<&str>::new()), "Available layers:");
    }
}
