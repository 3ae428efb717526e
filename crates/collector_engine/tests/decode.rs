use collector_engine::{DecodeError, PathDecoder, PayloadFormat, ResponseDecoder, Row};
use pretty_assertions::assert_eq;

fn json_decoder() -> PathDecoder {
    PathDecoder::new(
        PayloadFormat::Json,
        "response.body.items",
        Some("response.body.totalCount".to_string()),
        Some("OpenAPI_ServiceResponse".to_string()),
    )
}

fn row(pairs: &[(&str, &str)]) -> Row {
    Row(pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect())
}

#[test]
fn json_rows_and_total_are_read_from_nested_paths() {
    let body = br#"{
        "response": {
            "body": {
                "totalCount": "95",
                "items": [
                    {"region": "Seoul", "value": 10},
                    {"region": "Busan", "value": 20}
                ]
            }
        }
    }"#;

    let page = json_decoder().decode(body, Some("application/json")).unwrap();
    assert_eq!(page.total_count, Some(95));
    assert_eq!(
        page.rows,
        vec![
            row(&[("region", "Seoul"), ("value", "10")]),
            row(&[("region", "Busan"), ("value", "20")]),
        ]
    );
}

#[test]
fn nested_objects_flatten_with_joined_column_names() {
    let body = br#"{
        "response": {"body": {"items": [
            {"org": {"id": 7, "name": "HQ"}, "tags": ["a", "b"], "gone": null}
        ]}}
    }"#;

    let page = json_decoder().decode(body, None).unwrap();
    assert_eq!(
        page.rows,
        vec![row(&[
            ("org_id", "7"),
            ("org_name", "HQ"),
            ("tags", r#"["a","b"]"#),
            ("gone", ""),
        ])]
    );
}

#[test]
fn single_object_at_rows_path_is_one_row() {
    let body = br#"{"response": {"body": {"items": {"region": "Seoul"}}}}"#;
    let page = json_decoder().decode(body, None).unwrap();
    assert_eq!(page.rows, vec![row(&[("region", "Seoul")])]);
}

#[test]
fn absent_rows_node_is_a_clean_empty_page() {
    let body = br#"{"response": {"body": {"totalCount": 0}}}"#;
    let page = json_decoder().decode(body, None).unwrap();
    assert!(page.rows.is_empty());
    assert_eq!(page.total_count, Some(0));
}

#[test]
fn echo_marker_in_a_2xx_body_is_transient() {
    let body = br#"<OpenAPI_ServiceResponse><cmmMsgHeader>SERVICE_KEY_IS_NOT_REGISTERED</cmmMsgHeader></OpenAPI_ServiceResponse>"#;
    let err = json_decoder().decode(body, None).unwrap_err();
    assert_eq!(
        err,
        DecodeError::ErrorEcho {
            marker: "OpenAPI_ServiceResponse".to_string()
        }
    );
}

#[test]
fn malformed_json_is_rejected() {
    let err = json_decoder().decode(b"{not json", None).unwrap_err();
    assert!(matches!(err, DecodeError::Malformed { format: "json", .. }));
}

#[test]
fn scalar_at_rows_path_is_rejected() {
    let body = br#"{"response": {"body": {"items": 42}}}"#;
    let err = json_decoder().decode(body, None).unwrap_err();
    assert!(matches!(err, DecodeError::ScalarRows { .. }));
}

#[test]
fn xml_rows_decode_through_the_same_paths() {
    let decoder = PathDecoder::new(
        PayloadFormat::Xml,
        "rsp.body.items.item",
        Some("rsp.body.totalCount".to_string()),
        None,
    );
    let body = br#"<?xml version="1.0" encoding="UTF-8"?>
        <rsp>
          <body>
            <totalCount>2</totalCount>
            <items>
              <item code="a"><region>Seoul</region><value>10</value></item>
              <item code="b"><region>Busan</region><value>20</value></item>
            </items>
          </body>
        </rsp>"#;

    let page = decoder.decode(body, Some("text/xml")).unwrap();
    assert_eq!(page.total_count, Some(2));
    assert_eq!(
        page.rows,
        vec![
            row(&[("@code", "a"), ("region", "Seoul"), ("value", "10")]),
            row(&[("@code", "b"), ("region", "Busan"), ("value", "20")]),
        ]
    );
}

#[test]
fn soap_namespace_prefixes_are_stripped() {
    let decoder = PathDecoder::new(
        PayloadFormat::Xml,
        "Envelope.Body.listResponse.row",
        None,
        None,
    );
    let body = br#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
          <soap:Body>
            <ns2:listResponse xmlns:ns2="urn:example">
              <ns2:row><ns2:orgName>HQ</ns2:orgName></ns2:row>
            </ns2:listResponse>
          </soap:Body>
        </soap:Envelope>"#;

    let page = decoder.decode(body, None).unwrap();
    assert_eq!(page.rows, vec![row(&[("orgName", "HQ")])]);
}

#[test]
fn single_xml_item_still_yields_a_row() {
    let decoder = PathDecoder::new(PayloadFormat::Xml, "rsp.items.item", None, None);
    let body = br#"<rsp><items><item><region>Seoul</region></item></items></rsp>"#;
    let page = decoder.decode(body, None).unwrap();
    assert_eq!(page.rows, vec![row(&[("region", "Seoul")])]);
}

#[test]
fn legacy_charset_bodies_decode_via_content_type() {
    let decoder = PathDecoder::new(PayloadFormat::Json, "items", None, None);
    // "café" in windows-1252
    let body = b"{\"items\":[{\"name\":\"caf\xe9\"}]}";
    let page = decoder
        .decode(body, Some("application/json; charset=windows-1252"))
        .unwrap();
    assert_eq!(page.rows, vec![row(&[("name", "caf\u{e9}")])]);
}

#[test]
fn malformed_xml_is_rejected() {
    let decoder = PathDecoder::new(PayloadFormat::Xml, "rsp.items", None, None);
    let err = decoder.decode(b"<rsp><items></rsp>", None).unwrap_err();
    assert!(matches!(err, DecodeError::Malformed { format: "xml", .. }));
}
