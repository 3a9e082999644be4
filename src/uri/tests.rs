use super::*;

#[test]
fn test_template_normalization() {
    assert_eq!(UriTemplate::new("items").unwrap().template(), "/items");
    assert_eq!(UriTemplate::new("/items/").unwrap().template(), "/items");
    assert!(UriTemplate::new("/").unwrap().is_empty());
    assert!(UriTemplate::new("").unwrap().is_empty());
}

#[test]
fn test_template_variables() {
    let t = UriTemplate::new("/users/{id}/posts/{post: \\d+}").unwrap();
    assert_eq!(t.variables(), &["id".to_string(), "post".to_string()]);
    assert_eq!(t.number_of_template_variables(), 2);
    assert_eq!(t.number_of_explicit_regexes(), 1);
    assert_eq!(t.number_of_explicit_characters(), "/users//posts/".len());
}

#[test]
fn test_template_nested_braces_in_regex() {
    let t = UriTemplate::new("/year/{y: \\d{4}}").unwrap();
    let p = PathPattern::from_template(t, RightHandPath::CapturingZeroSegments).unwrap();
    assert!(p.match_path("/year/2024").is_some());
    assert!(p.match_path("/year/24").is_none());
}

#[test]
fn test_template_errors() {
    assert!(matches!(
        UriTemplate::new("/a/{id"),
        Err(TemplateError::UnclosedVariable { .. })
    ));
    assert!(matches!(
        UriTemplate::new("/a/{}"),
        Err(TemplateError::EmptyVariableName { .. })
    ));
    assert!(matches!(
        UriTemplate::new("/a/{x y}"),
        Err(TemplateError::InvalidVariableName { .. })
    ));
    assert!(matches!(
        UriTemplate::new("/a/{x: [}"),
        Err(TemplateError::InvalidRegex { .. })
    ));
}

#[test]
fn test_user_groups_become_non_capturing() {
    let p = PathPattern::new("/f/{name: (a|b)c}").unwrap();
    let m = p.match_path("/f/ac/rest").unwrap();
    assert_eq!(m.group("name"), Some("ac"));
    assert_eq!(m.right_hand_path(), "/rest");
}

#[test]
fn test_specificity_ordering() {
    let mut templates: Vec<UriTemplate> = ["/{a}", "", "/abc", "/ab/{x}", "/a/{x}/{y}"]
        .iter()
        .map(|t| UriTemplate::new(t).unwrap())
        .collect();
    templates.sort_by(|a, b| a.specificity_cmp(b));
    let order: Vec<&str> = templates.iter().map(|t| t.template()).collect();
    assert_eq!(order, vec!["/a/{x}/{y}", "/ab/{x}", "/abc", "/{a}", ""]);
}

#[test]
fn test_pattern_right_hand_path() {
    let p = PathPattern::new("a").unwrap();
    let m = p.match_path("/a/b/c").unwrap();
    assert_eq!(m.right_hand_path(), "/b/c");
    assert_eq!(m.consumed(), "a");
    assert!(p.match_path("/ab").is_none());

    let m = p.match_path("/a").unwrap();
    assert_eq!(m.right_hand_path(), "");
    assert!(m.is_end_of_path());
}

#[test]
fn test_pattern_zero_segments() {
    let p = PathPattern::with_right_hand_path("c", RightHandPath::CapturingZeroSegments).unwrap();
    assert!(p.match_path("/c").is_some());
    let m = p.match_path("/c/").unwrap();
    assert_eq!(m.right_hand_path(), "");
    assert_eq!(m.consumed(), "c");
    assert!(p.match_path("/c/d").is_none());
}

#[test]
fn test_end_of_path_pattern() {
    let p = PathPattern::end_of_path();
    assert!(p.is_end_of_path());
    assert!(p.match_path("").is_some());
    assert!(p.match_path("/").is_some());
    assert!(p.match_path("/x").is_none());
}

#[test]
fn test_pattern_groups() {
    let p = PathPattern::new("/items/{id}").unwrap();
    let m = p.match_path("/items/42/reviews").unwrap();
    assert_eq!(m.groups(), &[Some("42".to_string())]);
    assert_eq!(m.group("id"), Some("42"));
    assert_eq!(m.group("missing"), None);
    assert_eq!(m.right_hand_path(), "/reviews");
}

#[test]
fn test_decode_path_empty_segments() {
    let segments = decode_path("/p//p//p//", true);
    assert_eq!(segments.len(), 7);
    for (i, segment) in segments.iter().enumerate() {
        let expected = if i % 2 == 0 && i < 6 { "p" } else { "" };
        assert_eq!(segment.path(), expected, "segment {i}");
        assert!(segment.matrix_parameters().is_empty());
    }
}

#[test]
fn test_decode_path_matrix_parameters_order() {
    let segments = decode_path("/p;x=1;x=2;x=3", true);
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].path(), "p");
    let values = segments[0].matrix_parameters().get("x").unwrap();
    assert_eq!(values, &["1", "2", "3"]);
}

#[test]
fn test_decode_path_raw_and_decoded() {
    let raw = decode_path("/a%20b;k%3D=v%2F", false);
    assert_eq!(raw[0].path(), "a%20b");
    assert_eq!(raw[0].matrix_parameters().get_first("k%3D"), Some("v%2F"));

    let decoded = decode_path("/a%20b;k%3D=v%2F", true);
    assert_eq!(decoded[0].path(), "a b");
    assert_eq!(decoded[0].matrix_parameters().get_first("k="), Some("v/"));
}

#[test]
fn test_decode_query() {
    let raw = decode_query("a=1&a=2&b=x+y%21&flag&&=skip", false);
    assert_eq!(raw.get("a").unwrap(), &["1", "2"]);
    assert_eq!(raw.get_first("b"), Some("x+y%21"));
    assert_eq!(raw.get_first("flag"), Some(""));
    assert_eq!(raw.len(), 3);

    let decoded = decode_query("b=x+y%21", true);
    assert_eq!(decoded.get_first("b"), Some("x y!"));
}

#[test]
fn test_decode_invalid_utf8_is_lossy() {
    assert_eq!(decode("%FF", ComponentType::Path), "\u{FFFD}");
}

#[test]
fn test_immutable_map_rejects_mutation() {
    let mut map = MultivaluedMap::new();
    map.add("k", "v");
    let frozen = map.into_immutable();
    assert_eq!(frozen.get_first("k"), Some("v"));
    assert!(frozen.add("k", "w").is_err());
    assert!(frozen.put("k", vec![]).is_err());
    assert!(frozen.remove("k").is_err());
    assert!(frozen.clear().is_err());
    assert_eq!(frozen.get("k").unwrap().len(), 1);

    let mut copy = frozen.to_mutable();
    copy.add("k", "w");
    assert_eq!(copy.get("k").unwrap().len(), 2);
    assert_eq!(frozen.get("k").unwrap().len(), 1);
}

#[test]
fn test_read_only_list() {
    let list: ReadOnlyList<u8> = vec![1, 2, 3].into();
    assert_eq!(&list[..], &[1, 2, 3]);
    let err = list.push(4).unwrap_err();
    assert_eq!(err.operation, "push");
    assert!(list.remove(0).is_err());
    assert_eq!(list.len(), 3);
}

#[test]
fn test_multivalued_map_add_first() {
    let mut map = MultivaluedMap::new();
    map.add("id", "outer");
    map.add_first("id", "inner");
    assert_eq!(map.get_first("id"), Some("inner"));
    assert_eq!(map.get("id").unwrap(), &["inner", "outer"]);
}
