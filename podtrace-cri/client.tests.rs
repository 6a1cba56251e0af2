use super::*;

fn info_map(document: &str) -> HashMap<String, String> {
    HashMap::from([("info".to_owned(), document.to_owned())])
}

#[test]
fn pid_from_info_test() {
    assert_eq!(Some(4242), pid_from_info(&info_map(r#"{"pid":4242}"#)));
    assert_eq!(
        Some(1),
        pid_from_info(&info_map(r#"{"sandboxID":"abc","pid":1,"runtimeSpec":{}}"#))
    );

    // no document, no pid field, or pid that is not a positive number
    assert_eq!(None, pid_from_info(&HashMap::new()));
    assert_eq!(None, pid_from_info(&info_map(r#"{"sandboxID":"abc"}"#)));
    assert_eq!(None, pid_from_info(&info_map(r#"{"pid":"4242"}"#)));
    assert_eq!(None, pid_from_info(&info_map(r#"{"pid":0}"#)));
    assert_eq!(None, pid_from_info(&info_map(r#"{"pid":-1}"#)));
    assert_eq!(None, pid_from_info(&info_map("not json")));
}

#[test]
fn running_filter_test() {
    let filter = running_filter(None);
    assert_eq!(
        Some(proto::ContainerState::Running as i32),
        filter.state.map(|s| s.state)
    );
    assert!(filter.label_selector.is_empty());

    let pod = PodRef::new("default", "nginx-7bf8c");
    let filter = running_filter(Some(&pod));
    assert_eq!(Some("nginx-7bf8c"), filter.label_selector.get(POD_NAME_LABEL).map(String::as_str));
    assert_eq!(
        Some("default"),
        filter.label_selector.get(POD_NAMESPACE_LABEL).map(String::as_str)
    );
}

#[test]
fn container_summary_image_test() {
    let container = proto::Container {
        id: "c1".to_owned(),
        image: Some(proto::ImageSpec {
            image: "docker.io/library/nginx:1.27".to_owned(),
            ..Default::default()
        }),
        image_ref: "sha256:deadbeef".to_owned(),
        ..Default::default()
    };
    assert_eq!("docker.io/library/nginx:1.27", ContainerSummary::from(container).image);

    // image ref is the fallback when the runtime omits the image spec
    let container = proto::Container {
        id: "c2".to_owned(),
        image_ref: "sha256:deadbeef".to_owned(),
        ..Default::default()
    };
    assert_eq!("sha256:deadbeef", ContainerSummary::from(container).image);
}
