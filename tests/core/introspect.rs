//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Ji.
//! The Ji project belongs to the Dunimd project team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

#[path = "../common/mod.rs"]
mod common;

use common::{fake_loader, write_source};
use ji::introspect::*;
use ji::session::{JiCHandle, JiCLoadSession};
use ji::{JiCLoader, JiCValue, JiCValueKind, JiError};
use tempfile::TempDir;

const SHAPES: &str = "\
class geo.Shapes public
field public static final I MAX = 10
field public static I LIMIT = 30
field public static Ljava/lang/String; GREETING = \"hi\"
field public static Z FLAG = true
field public static C LETTER = 'A'
field public static J BIG = 1234567890123
field public static D RATIO = 2.5
field public static [Ljava/lang/String; NAMES
field private I count
field protected static Ljava/lang/Object; LOCK
opaque
field public static I LATE = 7
method public static add (II)I
method public static f ([Ljava/lang/String;)[Ljava/lang/String;
method protected tick ()V
method helper ()V
init public ()V
init private (ILjava/lang/String;)V
";

fn load(dir: &TempDir, source: &str) -> (JiCLoader, JiCLoadSession) {
    let (loader, _) = fake_loader(dir.path());
    let path = write_source(dir.path(), "Shapes.java", source);
    let session = loader.JiFLoadFromFile([&path]).unwrap();
    (loader, session)
}

fn shapes(dir: &TempDir) -> (JiCLoadSession, JiCHandle) {
    let (_, session) = load(dir, SHAPES);
    let handle = session.JiFSlots()[0].unwrap();
    (session, handle)
}

fn find<'a>(members: &'a [JiCMemberDescriptor], name: &str) -> &'a JiCMemberDescriptor {
    members
        .iter()
        .find(|m| m.name == name)
        .unwrap_or_else(|| panic!("no member {}", name))
}

#[test]
fn JiFTUnitWithoutMembersHasEmptyTables() {
    let dir = TempDir::new().unwrap();
    let (_, session) = load(&dir, "class geo.Empty public\n");
    let handle = session.JiFSlots()[0].unwrap();

    assert!(session.JiFDiscoverMethods(handle).unwrap().is_empty());
    assert!(session.JiFDiscoverFields(handle).unwrap().is_empty());
    assert!(session.JiFDiscoverConstructors(handle).unwrap().is_empty());
}

#[test]
fn JiFTCallSignaturesUseDescriptorEncoding() {
    let dir = TempDir::new().unwrap();
    let (session, handle) = shapes(&dir);
    let methods = session.JiFDiscoverMethods(handle).unwrap();

    let add = find(methods, "add");
    assert_eq!(add.JiFSignatureString(), "(II)I");
    assert_eq!(add.JiFParameterCount(), 2);
    assert!(add.JiFIsStatic());
    assert_eq!(add.kind, JiCMemberKind::Method);

    let f = find(methods, "f");
    assert_eq!(
        f.JiFSignatureString(),
        "([Ljava/lang/String;)[Ljava/lang/String;"
    );
}

#[test]
fn JiFTMethodsExcludeInitializers() {
    let dir = TempDir::new().unwrap();
    let (session, handle) = shapes(&dir);
    let names: Vec<&str> = session
        .JiFDiscoverMethods(handle)
        .unwrap()
        .iter()
        .map(|m| m.name.as_str())
        .collect();

    assert_eq!(names, vec!["add", "f", "tick", "helper"]);
}

#[test]
fn JiFTConstructorsAreNamedAfterTheUnit() {
    let dir = TempDir::new().unwrap();
    let (session, handle) = shapes(&dir);
    let constructors = session.JiFDiscoverConstructors(handle).unwrap();

    assert_eq!(constructors.len(), 2);
    for ctor in constructors {
        assert_eq!(ctor.name, "geo.Shapes");
        assert_eq!(ctor.kind, JiCMemberKind::Constructor);
        assert!(!ctor.JiFIsStatic());
    }
    assert_eq!(constructors[0].JiFSignatureString(), "()V");
    assert_eq!(constructors[1].JiFSignatureString(), "(ILjava/lang/String;)V");
    assert_eq!(constructors[1].visibility, JiCVisibility::Private);
}

#[test]
fn JiFTVisibilityAndStaticnessFollowAccessFlags() {
    let dir = TempDir::new().unwrap();
    let (session, handle) = shapes(&dir);
    let fields = session.JiFDiscoverFields(handle).unwrap();
    let methods = session.JiFDiscoverMethods(handle).unwrap();

    let count = find(fields, "count");
    assert_eq!(count.visibility, JiCVisibility::Private);
    assert_eq!(count.staticness, JiCStaticness::Instance);

    let lock = find(fields, "LOCK");
    assert_eq!(lock.visibility, JiCVisibility::Protected);
    assert_eq!(lock.staticness, JiCStaticness::Static);

    assert_eq!(find(methods, "tick").visibility, JiCVisibility::Protected);
    assert_eq!(find(methods, "helper").visibility, JiCVisibility::Public);
}

#[test]
fn JiFTDiscoveryIsStableAcrossCalls() {
    let dir = TempDir::new().unwrap();
    let (session, handle) = shapes(&dir);

    let first = session.JiFDiscoverFields(handle).unwrap().to_vec();
    session.JiFSetInt(handle, "LIMIT", 1).unwrap();
    let second = session.JiFDiscoverFields(handle).unwrap().to_vec();
    assert_eq!(first, second);
}

#[test]
fn JiFTStaticSlotsStartFromDeclaredValues() {
    let dir = TempDir::new().unwrap();
    let (session, handle) = shapes(&dir);

    assert_eq!(session.JiFGetInt(handle, "MAX").unwrap(), 10);
    assert_eq!(session.JiFGetInt(handle, "LIMIT").unwrap(), 30);
    assert_eq!(
        session.JiFGetString(handle, "GREETING").unwrap().as_deref(),
        Some("hi")
    );
    assert!(session.JiFGetBoolean(handle, "FLAG").unwrap());
    assert_eq!(session.JiFGetChar(handle, "LETTER").unwrap(), 'A');
    assert_eq!(session.JiFGetLong(handle, "BIG").unwrap(), 1_234_567_890_123);
    assert_eq!(session.JiFGetDouble(handle, "RATIO").unwrap(), 2.5);
    assert_eq!(
        session
            .JiFGetStaticField(handle, "NAMES", JiCValueKind::Reference)
            .unwrap(),
        JiCValue::Null
    );
}

#[test]
fn JiFTInitializerEvaluationStopsAtUnknownCode() {
    let dir = TempDir::new().unwrap();
    let (session, handle) = shapes(&dir);

    assert_eq!(session.JiFGetInt(handle, "LATE").unwrap(), 0);
}

#[test]
fn JiFTUnknownOrInstanceKeysAreMemberNotFound() {
    let dir = TempDir::new().unwrap();
    let (session, handle) = shapes(&dir);

    for key in ["missing", "count"] {
        match session.JiFGetInt(handle, key) {
            Err(JiError::MemberNotFound { unit, member }) => {
                assert_eq!(unit, "geo.Shapes");
                assert_eq!(member, key);
            }
            other => panic!("expected MemberNotFound for {}, got {:?}", key, other),
        }
    }
    assert!(matches!(
        session.JiFSetInt(handle, "missing", 1),
        Err(JiError::MemberNotFound { .. })
    ));
}

#[test]
fn JiFTWrongKindIsTypeMismatch() {
    let dir = TempDir::new().unwrap();
    let (session, handle) = shapes(&dir);

    assert!(matches!(
        session.JiFGetInt(handle, "GREETING"),
        Err(JiError::TypeMismatch { .. })
    ));
    assert!(matches!(
        session.JiFGetString(handle, "LIMIT"),
        Err(JiError::TypeMismatch { .. })
    ));
    assert!(matches!(
        session.JiFSetStaticField(handle, "LIMIT", JiCValue::String("x".into())),
        Err(JiError::TypeMismatch { .. })
    ));
    assert!(matches!(
        session.JiFSetStaticField(handle, "LIMIT", JiCValue::Null),
        Err(JiError::TypeMismatch { .. })
    ));
    assert_eq!(session.JiFGetInt(handle, "LIMIT").unwrap(), 30);
}

#[test]
fn JiFTFinalStaticIsReadOnly() {
    let dir = TempDir::new().unwrap();
    let (session, handle) = shapes(&dir);

    assert!(matches!(
        session.JiFSetInt(handle, "MAX", 11),
        Err(JiError::ReadOnly { .. })
    ));
    assert_eq!(session.JiFGetInt(handle, "MAX").unwrap(), 10);
}

#[test]
fn JiFTReferenceSlotsAcceptNull() {
    let dir = TempDir::new().unwrap();
    let (session, handle) = shapes(&dir);

    session
        .JiFSetStaticField(handle, "GREETING", JiCValue::Null)
        .unwrap();
    assert_eq!(session.JiFGetString(handle, "GREETING").unwrap(), None);

    session
        .JiFSetStaticField(handle, "GREETING", JiCValue::String("bye".into()))
        .unwrap();
    assert_eq!(
        session.JiFGetString(handle, "GREETING").unwrap().as_deref(),
        Some("bye")
    );
}

#[test]
fn JiFTFieldTypeNamesAreSourceLevel() {
    let dir = TempDir::new().unwrap();
    let (session, handle) = shapes(&dir);

    assert_eq!(session.JiFFieldTypeName(handle, "LIMIT").unwrap(), "int");
    assert_eq!(
        session.JiFFieldTypeName(handle, "NAMES").unwrap(),
        "java.lang.String[]"
    );
    assert_eq!(
        session.JiFFieldTypeName(handle, "count").unwrap(),
        "int"
    );
    assert!(matches!(
        session.JiFFieldTypeName(handle, "nope"),
        Err(JiError::MemberNotFound { .. })
    ));
}

#[test]
fn JiFTDescriptorsSerializeToJson() {
    let dir = TempDir::new().unwrap();
    let (session, handle) = shapes(&dir);
    let add = find(session.JiFDiscoverMethods(handle).unwrap(), "add").clone();

    let json = serde_json::to_string(&add).unwrap();
    let back: JiCMemberDescriptor = serde_json::from_str(&json).unwrap();
    assert_eq!(back, add);
}
