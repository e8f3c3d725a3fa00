//! Query evaluation against parsed documents.

use pretty_assertions::assert_eq;
use xmerge_query::{NamespaceBindings, Query, QueryError, QueryNode, Value};
use xmerge_xml::{Document, Element, NodeId, parse};

const CATALOG: &str = r#"<catalog>
  <item id="a" kind="tool">Hammer</item>
  <item id="b" kind="tool">Saw</item>
  <item id="c" kind="food">  Bread   roll </item>
  <group name="g"><item id="d">Nested</item></group>
</catalog>"#;

fn doc(xml: &str) -> (Document, NodeId) {
    let doc = parse(xml, "test").unwrap();
    let root = doc.document_element().unwrap();
    (doc, root)
}

/// `id` attributes of the elements a query selects from the root.
fn ids(doc: &Document, context: NodeId, query: &str) -> Vec<String> {
    let query = Query::compile(query).unwrap();
    query
        .select_elements(doc, context, &NamespaceBindings::new())
        .unwrap()
        .into_iter()
        .map(|id| {
            doc.element(id)
                .unwrap()
                .attribute_value("id")
                .unwrap_or("-")
                .to_string()
        })
        .collect()
}

fn eval(doc: &Document, context: NodeId, query: &str) -> Value {
    Query::compile(query)
        .unwrap()
        .evaluate(doc, context, &NamespaceBindings::new())
        .unwrap()
}

#[test]
fn test_child_and_descendant_selection() {
    let (doc, root) = doc(CATALOG);
    assert_eq!(ids(&doc, root, "item"), vec!["a", "b", "c"]);
    assert_eq!(ids(&doc, root, ".//item"), vec!["a", "b", "c", "d"]);
    assert_eq!(ids(&doc, root, "//item"), vec!["a", "b", "c", "d"]);
    assert_eq!(ids(&doc, root, "group/item"), vec!["d"]);
    assert_eq!(ids(&doc, root, "*"), vec!["a", "b", "c", "-"]);
}

#[test]
fn test_attribute_predicates() {
    let (doc, root) = doc(CATALOG);
    assert_eq!(ids(&doc, root, "item[@id='b']"), vec!["b"]);
    assert_eq!(ids(&doc, root, "item[@kind='tool']"), vec!["a", "b"]);
    assert_eq!(ids(&doc, root, "item[@kind!='tool']"), vec!["c"]);
    assert_eq!(ids(&doc, root, "item[@kind='tool' and @id='a']"), vec!["a"]);
    assert_eq!(ids(&doc, root, "item[@id='a' or @id='c']"), vec!["a", "c"]);
    assert_eq!(ids(&doc, root, "item[not(@kind)]"), Vec::<String>::new());
    assert_eq!(ids(&doc, root, "//item[not(@kind)]"), vec!["d"]);
}

#[test]
fn test_positional_predicates() {
    let (doc, root) = doc(CATALOG);
    assert_eq!(ids(&doc, root, "item[2]"), vec!["b"]);
    assert_eq!(ids(&doc, root, "item[last()]"), vec!["c"]);
    assert_eq!(ids(&doc, root, "item[position() < 3]"), vec!["a", "b"]);
    assert_eq!(ids(&doc, root, "(//item)[4]"), vec!["d"]);
}

#[test]
fn test_reverse_axes_count_nearest_first() {
    let (doc, root) = doc(CATALOG);
    let c = Query::compile("item[@id='c']")
        .unwrap()
        .select_elements(&doc, root, &NamespaceBindings::new())
        .unwrap()[0];
    assert_eq!(ids(&doc, c, "preceding-sibling::item[1]"), vec!["b"]);
    assert_eq!(ids(&doc, c, "preceding-sibling::item"), vec!["a", "b"]);
    assert_eq!(ids(&doc, c, "following-sibling::*"), vec!["-"]);
    assert_eq!(ids(&doc, c, ".."), vec!["-"]);
    assert_eq!(ids(&doc, c, "ancestor::catalog"), vec!["-"]);
    assert_eq!(ids(&doc, c, "self::item"), vec!["c"]);
}

#[test]
fn test_text_predicates() {
    let (doc, root) = doc(CATALOG);
    assert_eq!(ids(&doc, root, "item[text()='Saw']"), vec!["b"]);
    assert_eq!(ids(&doc, root, "item[.='Hammer']"), vec!["a"]);
    assert_eq!(
        ids(&doc, root, "item[normalize-space(.)='Bread roll']"),
        vec!["c"]
    );
    assert_eq!(ids(&doc, root, "item[contains(., 'a')]"), vec!["a", "b", "c"]);
    assert_eq!(ids(&doc, root, "item[starts-with(@kind, 'fo')]"), vec!["c"]);
}

#[test]
fn test_values() {
    let (doc, root) = doc(CATALOG);
    assert_eq!(eval(&doc, root, "count(item)"), Value::Number(3.0));
    assert_eq!(eval(&doc, root, "count(//@id)"), Value::Number(4.0));
    assert_eq!(
        eval(&doc, root, "string(item[2])"),
        Value::String("Saw".to_string())
    );
    assert_eq!(
        eval(&doc, root, "concat(item[1]/@id, '-', item[2]/@id)"),
        Value::String("a-b".to_string())
    );
    assert_eq!(
        eval(&doc, root, "substring-before('key=value', '=')"),
        Value::String("key".to_string())
    );
    assert_eq!(
        eval(&doc, root, "substring-after('key=value', '=')"),
        Value::String("value".to_string())
    );
    assert_eq!(
        eval(&doc, root, "substring('12345', 2, 3)"),
        Value::String("234".to_string())
    );
    assert_eq!(eval(&doc, root, "string-length('abc')"), Value::Number(3.0));
    assert_eq!(eval(&doc, root, "10 div 4"), Value::Number(2.5));
    assert_eq!(eval(&doc, root, "7 mod 3"), Value::Number(1.0));
    assert_eq!(eval(&doc, root, "-(2 + 3) * 2"), Value::Number(-10.0));
    assert_eq!(eval(&doc, root, "item = 'Saw'"), Value::Boolean(true));
    assert_eq!(eval(&doc, root, "item != 'Saw'"), Value::Boolean(true));
    assert_eq!(eval(&doc, root, "boolean(missing)"), Value::Boolean(false));
    assert_eq!(eval(&doc, root, "name()"), Value::String("catalog".to_string()));
}

#[test]
fn test_default_namespace_binding() {
    let (doc, root) = doc(r#"<root xmlns="urn:d"><item/><other xmlns=""/></root>"#);

    let query = Query::compile("item").unwrap();
    let unbound = query
        .select_elements(&doc, root, &NamespaceBindings::new())
        .unwrap();
    assert!(unbound.is_empty());

    let bindings = NamespaceBindings::in_scope(&doc, root);
    assert_eq!(bindings.default_element_namespace(), Some("urn:d"));
    assert_eq!(query.select_elements(&doc, root, &bindings).unwrap().len(), 1);

    let other = Query::compile("other").unwrap();
    assert_eq!(
        other
            .select_elements(&doc, root, &NamespaceBindings::new())
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn test_prefixed_names() {
    let (doc, root) = doc(
        r#"<root xmlns:a="urn:a" xmlns:b="urn:b"><a:item a:flag="1" flag="2"/><b:item/></root>"#,
    );
    let mut bindings = NamespaceBindings::new();
    bindings.bind("x", "urn:a");

    let select = |query: &str| {
        Query::compile(query)
            .unwrap()
            .select(&doc, root, &bindings)
            .unwrap()
            .len()
    };
    assert_eq!(select("x:item"), 1);
    assert_eq!(select("x:*"), 1);
    assert_eq!(select("x:item/@x:flag"), 1);
    assert_eq!(select("x:item/@flag"), 1);
    assert_eq!(select("x:item/@*"), 2);
    assert_eq!(select("*[local-name()='item' and namespace-uri()='urn:b']"), 1);

    let unbound = Query::compile("y:item")
        .unwrap()
        .select(&doc, root, &bindings);
    assert_eq!(
        unbound,
        Err(QueryError::UnboundPrefix {
            prefix: "y".to_string()
        })
    );
}

#[test]
fn test_namespace_declarations_are_not_attributes() {
    let (doc, root) = doc(r#"<root xmlns="urn:d" xmlns:m="urn:m" a="1"/>"#);
    assert_eq!(eval(&doc, root, "count(@*)"), Value::Number(1.0));
}

#[test]
fn test_select_rejects_non_node_sets() {
    let (doc, root) = doc(CATALOG);
    let result = Query::compile("count(item)")
        .unwrap()
        .select(&doc, root, &NamespaceBindings::new());
    assert!(matches!(result, Err(QueryError::Type { .. })));
}

#[test]
fn test_query_keeps_source() {
    let query = Query::compile("a[@b = \"c'd\"]").unwrap();
    assert_eq!(query.as_str(), "a[@b = \"c'd\"]");
    assert_eq!(query.to_string(), "a[@b = \"c'd\"]");
}

#[test]
fn test_document_axes() {
    let (doc, root) = doc(r#"<r><a id="1"/><a id="2"/><b id="3"><a id="4"/></b><a id="5"/></r>"#);
    let b = ids_of(&doc, root, "b")[0];
    assert_eq!(ids(&doc, b, "preceding::a[1]"), vec!["2"]);
    assert_eq!(ids(&doc, b, "preceding::a"), vec!["1", "2"]);
    assert_eq!(ids(&doc, b, "following::a"), vec!["5"]);
    assert_eq!(ids(&doc, b, "descendant-or-self::*"), vec!["3", "4"]);
    assert_eq!(ids(&doc, b, "ancestor-or-self::*[1]"), vec!["3"]);
}

fn ids_of(doc: &Document, context: NodeId, query: &str) -> Vec<NodeId> {
    Query::compile(query)
        .unwrap()
        .select_elements(doc, context, &NamespaceBindings::new())
        .unwrap()
}

#[test]
fn test_attributes_map_to_their_owner() {
    let (doc, root) = doc(r#"<r xmlns:x="urn:x"><a id="1" x:k="v"/></r>"#);
    let a = ids_of(&doc, root, "a")[0];
    let mut bindings = NamespaceBindings::new();
    bindings.bind("x", "urn:x");
    let selected = Query::compile("a/@x:k")
        .unwrap()
        .select(&doc, root, &bindings)
        .unwrap();
    assert_eq!(selected, vec![QueryNode::Attribute(a, 1)]);
    assert_eq!(selected[0].node_id(), a);
}

#[test]
fn test_default_namespace_with_other_prefixes() {
    let (doc, root) = doc(
        r#"<project xmlns="urn:p" xmlns:o="urn:o"><item id="1"><o:ext/></item><item id="2"/></project>"#,
    );
    let bindings = NamespaceBindings::in_scope(&doc, root);
    let found = Query::compile("item[o:ext]")
        .unwrap()
        .select_elements(&doc, root, &bindings)
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(doc.element(found[0]).unwrap().attribute_value("id"), Some("1"));

    let by_name = Query::compile("item[local-name()='item' and namespace-uri()='urn:p'][@id='2']")
        .unwrap()
        .select_elements(&doc, root, &bindings)
        .unwrap();
    assert_eq!(by_name.len(), 1);
}

#[test]
fn test_invalid_expressions() {
    assert!(matches!(
        Query::compile("item[@id='a'"),
        Err(QueryError::Syntax { .. })
    ));

    let (doc, root) = doc(CATALOG);
    let result = Query::compile("item[no-such-function()]")
        .unwrap()
        .select(&doc, root, &NamespaceBindings::new());
    assert!(matches!(result, Err(QueryError::Evaluation { .. })));
}

#[test]
fn test_detached_context() {
    let (mut doc, _) = doc(CATALOG);
    let orphan = doc.create_element(Element::new(None, "orphan", None));
    let result = Query::compile(".")
        .unwrap()
        .select(&doc, orphan, &NamespaceBindings::new());
    assert_eq!(result, Err(QueryError::DetachedContext { node: orphan }));
}
