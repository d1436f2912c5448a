use rpmpkg::{Error, Package};

/// Builds a minimal but structurally valid RPM byte stream: lead, an empty
/// signature header, and a main header carrying the given tags.
struct FixtureBuilder {
    tags: Vec<(u32, u32, Vec<u8>, u32)>,
}

impl FixtureBuilder {
    fn new() -> Self {
        FixtureBuilder { tags: Vec::new() }
    }

    fn string(mut self, tag_id: u32, value: &str) -> Self {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        self.tags.push((tag_id, 6, bytes, 1));
        self
    }

    fn string_array(mut self, tag_id: u32, values: &[&str]) -> Self {
        let mut bytes = Vec::new();
        for v in values {
            bytes.extend_from_slice(v.as_bytes());
            bytes.push(0);
        }
        self.tags.push((tag_id, 8, bytes, values.len() as u32));
        self
    }

    fn int32_array(mut self, tag_id: u32, values: &[i32]) -> Self {
        let mut bytes = Vec::new();
        for v in values {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        self.tags.push((tag_id, 4, bytes, values.len() as u32));
        self
    }

    fn build_header(&self, align: bool) -> Vec<u8> {
        let mut store = Vec::new();
        let mut index = Vec::new();
        for (tag_id, type_code, bytes, count) in &self.tags {
            let offset = store.len() as u32;
            store.extend_from_slice(bytes);
            index.extend_from_slice(&tag_id.to_be_bytes());
            index.extend_from_slice(&type_code.to_be_bytes());
            index.extend_from_slice(&offset.to_be_bytes());
            index.extend_from_slice(&count.to_be_bytes());
        }
        let mut buf = Vec::new();
        buf.extend_from_slice(&[0x8E, 0xAD, 0xE8]);
        buf.push(1);
        buf.extend_from_slice(&[0u8; 4]);
        buf.extend_from_slice(&(self.tags.len() as u32).to_be_bytes());
        buf.extend_from_slice(&(store.len() as u32).to_be_bytes());
        buf.extend_from_slice(&index);
        buf.extend_from_slice(&store);
        if align && store.len() % 8 != 0 {
            buf.extend(std::iter::repeat(0u8).take(8 - store.len() % 8));
        }
        buf
    }
}

fn lead_bytes() -> Vec<u8> {
    let mut buf = Vec::with_capacity(96);
    buf.extend_from_slice(&[0xED, 0xAB, 0xEE, 0xDB]);
    buf.push(3);
    buf.push(0);
    buf.extend_from_slice(&0u16.to_be_bytes());
    buf.extend_from_slice(&1u16.to_be_bytes());
    let mut name = b"widget-1.0-1".to_vec();
    name.resize(66, 0);
    buf.extend_from_slice(&name);
    buf.extend_from_slice(&1u16.to_be_bytes());
    buf.extend_from_slice(&5u16.to_be_bytes());
    buf.extend_from_slice(&[0u8; 16]);
    buf
}

/// A package with one Requires and one Provides, used across the round-trip
/// and bounds-safety tests below.
fn package_with_dependencies() -> Vec<u8> {
    let sig = FixtureBuilder::new().build_header(true);

    let header = FixtureBuilder::new()
        .string(1000, "widget")
        .string(1001, "1.0")
        .string(1002, "1")
        .string(1014, "MIT")
        .string(1022, "x86_64")
        .int32_array(1048, &[1 << 3]) // RequireFlags: EQUAL
        .string_array(1049, &["libfoo"]) // RequireName
        .string_array(1050, &["2.0-1"]) // RequireVersion
        .int32_array(1112, &[1 << 3]) // ProvideFlags
        .string_array(1047, &["widget"]) // ProvideName
        .string_array(1113, &["1.0-1"]) // ProvideVersion
        .build_header(false);

    let mut buf = lead_bytes();
    buf.extend(sig);
    buf.extend(header);
    buf
}

#[test]
fn parses_name_version_release_and_arch() {
    let bytes = package_with_dependencies();
    let package = Package::parse(&mut bytes.as_slice()).unwrap();
    assert_eq!(package.name(), "widget");
    assert_eq!(package.version(), "1.0");
    assert_eq!(package.release(), "1");
    assert_eq!(package.license(), "MIT");
    assert_eq!(package.architecture(), "x86_64");
    assert_eq!(package.to_string(), "widget-1.0-1.x86_64");
}

#[test]
fn parses_requires_and_provides() {
    let bytes = package_with_dependencies();
    let package = Package::parse(&mut bytes.as_slice()).unwrap();

    let requires = package.requires();
    assert_eq!(requires.len(), 1);
    assert_eq!(requires[0].name, "libfoo");
    assert_eq!(requires[0].to_string(), "libfoo = 2.0.1");

    let provides = package.provides();
    assert_eq!(provides.len(), 1);
    assert_eq!(provides[0].name, "widget");
}

#[test]
fn zero_buffer_is_not_an_rpm_file() {
    let bytes = [0u8; 96];
    let err = Package::parse(&mut bytes.as_slice()).unwrap_err();
    assert!(matches!(err, Error::NotRpmFile));
}

#[test]
fn truncation_anywhere_in_the_headers_is_an_error_not_a_panic() {
    let bytes = package_with_dependencies();
    for cut in (0..bytes.len()).step_by(7) {
        let err = Package::parse(&mut &bytes[..cut]).unwrap_err();
        assert!(
            matches!(err, Error::UnexpectedEnd),
            "expected UnexpectedEnd truncating at byte {}, got {:?}",
            cut,
            err
        );
    }
}

#[test]
fn full_length_buffer_still_parses_after_the_truncation_sweep() {
    let bytes = package_with_dependencies();
    Package::parse(&mut bytes.as_slice()).unwrap();
}
