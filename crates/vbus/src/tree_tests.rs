use super::*;
use serde_json::json;

#[test]
fn insert_child_creates_intermediate_nodes() -> anyhow::Result<()> {
    let mut root = Element::empty_node();
    let parent = vec!["dev".to_owned()];
    insert_child(&mut root, &parent, "name", Element::attribute("name", Some(json!("X")), json!({"type": "string"})))?;

    let found = root.search_path(&["dev".to_owned(), "name".to_owned()]);
    assert!(found.is_some());
    Ok(())
}

#[test]
fn remove_child_returns_rendered_form_and_drops_it() -> anyhow::Result<()> {
    let mut root = Element::empty_node();
    let parent: Vec<String> = vec![];
    insert_child(&mut root, &parent, "name", Element::attribute("name", Some(json!("X")), json!({"type": "string"})))?;

    let removed = remove_child(&mut root, &parent, "name");
    assert!(removed.is_some());
    assert!(root.search_path(&["name".to_owned()]).is_none());
    Ok(())
}

#[test]
fn set_attribute_value_updates_cached_value() -> anyhow::Result<()> {
    let mut root = Element::empty_node();
    let parent: Vec<String> = vec![];
    insert_child(&mut root, &parent, "temp", Element::attribute("temp", None, json!({"type": "integer"})))?;

    set_attribute_value(&mut root, &["temp".to_owned()], json!(21));

    let found = root.search_path(&["temp".to_owned(), "value".to_owned()]).ok_or_else(|| anyhow::anyhow!("missing"))?;
    if let Element::Attribute(attr) = found {
        assert_eq!(attr.value, Some(json!(21)));
    } else {
        anyhow::bail!("expected attribute");
    }
    Ok(())
}
