//! Repeated merges of a template tree into an IDE workspace.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use xmerge_workspace::{DirectoryMerger, MergeSummary, Settings, Variables};

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

const MISC_SETUP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project version="4">
  <component name="ProjectRootManager" project-jdk-name="17"/>
</project>
"#;

const MISC_UPDATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns:merge="https://github.com/devonfw/IDEasy/merge" version="4">
  <component name="ProjectRootManager" project-jdk-name="21" project-jdk-type="JavaSDK"/>
  <component name="GitSettings" merge:strategy="override">
    <option name="PATH_TO_GIT" value="${GIT_HOME}/bin/git"/>
  </component>
  <component name="RunManager">
    <configuration merge:id="@type" type="JUnit" default="true">
      <option name="WORKING_DIRECTORY" value="$MODULE_DIR$"/>
    </configuration>
  </component>
</project>
"#;

#[test]
fn test_setup_then_repeated_updates() {
    let temp = TempDir::new().unwrap();
    let setup = temp.path().join("setup");
    let update = temp.path().join("update");
    let workspace = temp.path().join("workspace");
    write(&setup.join(".idea/misc.xml"), MISC_SETUP);
    write(&update.join(".idea/misc.xml"), MISC_UPDATE);
    write(&update.join(".editorconfig"), "root = true\n");

    let variables: Variables = [("GIT_HOME", "/usr")].into_iter().collect();
    let merger = DirectoryMerger::new(&Settings::default());

    let first = merger
        .merge(Some(setup.as_path()), &update, &variables, &workspace)
        .unwrap();
    assert_eq!(
        first,
        MergeSummary {
            files: 2,
            errors: 0,
            warnings: 0,
        }
    );

    let expected = r#"<?xml version="1.0" encoding="UTF-8"?>
<project version="4">
  <component name="ProjectRootManager" project-jdk-name="21" project-jdk-type="JavaSDK"/>
  <component name="GitSettings">
    <option name="PATH_TO_GIT" value="/usr/bin/git"/>
  </component>
  <component name="RunManager">
    <configuration type="JUnit" default="true">
      <option name="WORKING_DIRECTORY" value="$MODULE_DIR$"/>
    </configuration>
  </component>
</project>
"#;
    let misc = workspace.join(".idea/misc.xml");
    assert_eq!(fs::read_to_string(&misc).unwrap(), expected);
    assert_eq!(
        fs::read_to_string(workspace.join(".editorconfig")).unwrap(),
        "root = true\n"
    );

    // user edits survive, template values win
    let edited = expected.replace(
        r#"project-jdk-type="JavaSDK"/>"#,
        r#"project-jdk-type="JavaSDK" languageLevel="JDK_21"/>"#,
    );
    fs::write(&misc, &edited).unwrap();
    let second = merger
        .merge(Some(setup.as_path()), &update, &variables, &workspace)
        .unwrap();
    assert!(second.is_success());
    assert_eq!(fs::read_to_string(&misc).unwrap(), edited);
}

#[test]
fn test_ambiguous_workspace_fails_only_when_strict() {
    let temp = TempDir::new().unwrap();
    let update = temp.path().join("update");
    let workspace = temp.path().join("workspace");
    write(
        &update.join("workspace.xml"),
        r#"<project xmlns:merge="https://github.com/devonfw/IDEasy/merge"><configuration merge:id="@type" type="JUnit" default="true"/></project>"#,
    );
    let duplicated = r#"<project><configuration type="JUnit" name="a"/><configuration type="JUnit" name="b"/></project>"#;
    write(&workspace.join("workspace.xml"), duplicated);

    let strict = Settings {
        fail_on_ambiguous_merge: true,
        ..Settings::default()
    };
    let summary = DirectoryMerger::new(&strict)
        .merge(None, &update, &Variables::new(), &workspace)
        .unwrap();
    assert_eq!(summary.errors, 1);
    assert_eq!(
        fs::read_to_string(workspace.join("workspace.xml")).unwrap(),
        duplicated
    );

    let summary = DirectoryMerger::new(&Settings::default())
        .merge(None, &update, &Variables::new(), &workspace)
        .unwrap();
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.warnings, 1);
    assert!(
        fs::read_to_string(workspace.join("workspace.xml"))
            .unwrap()
            .contains(r#"<configuration type="JUnit" name="a" default="true"/>"#)
    );
}
