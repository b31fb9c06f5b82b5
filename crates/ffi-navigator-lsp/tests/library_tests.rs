//! Library integration tests for ffi-navigator-lsp
//!
//! These tests drive the crate through its public API only, the way the
//! CLI and other embedders use it.

use std::fs;
use std::path::Path;

use ffi_navigator_core::{split_lines, Position};
use ffi_navigator_lsp::{dedup_locations, DialectKind, Settings, Workspace};

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn test_dgl_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write(root, "python/dgl/__init__.py", "from . import nodeflow\n");
    write(root, "python/dgl/_ffi/function.py", "def _init_api(name):\n    pass\n");
    write(
        root,
        "python/dgl/nodeflow.py",
        "from ._ffi.function import _init_api\n\n\ndef flow(g):\n    return _CAPI_NodeFlowGetGraph(g)\n\n\n_init_api(\"dgl.nodeflow\")\n",
    );
    write(
        root,
        "src/graph/sampler.cc",
        "DGL_REGISTER_GLOBAL(\"nodeflow._CAPI_NodeFlowGetGraph\")\n.set_body(GetGraph);\n",
    );

    assert_eq!(DialectKind::detect(root), Some(DialectKind::Dgl));

    let ws = Workspace::new();
    ws.initialize(root).unwrap();
    let root = ws.root().unwrap();
    let module = root.join("python/dgl/nodeflow.py");

    let defs = ws.find_defs(&module, "_CAPI_NodeFlowGetGraph");
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].key, "nodeflow._CAPI_NodeFlowGetGraph");
    assert_eq!(defs[0].path, root.join("src/graph/sampler.cc"));

    let text = fs::read_to_string(&module).unwrap();
    let lines = split_lines(&text);
    let at_call = ws.definitions_at(&module, &lines, Position::new(4, 15));
    assert_eq!(at_call.len(), 1);
}

#[test]
fn test_mxnet_cursor_lookup() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write(root, "python/mxnet/__init__.py", "");
    write(
        root,
        "python/mxnet/executor.py",
        "def forward(handle):\n    check_call(_LIB.MXExecutorForward(handle, 0))\n",
    );
    write(
        root,
        "src/c_api/c_api_executor.cc",
        "int MXExecutorForward(ExecutorHandle handle, int is_train) {\n  API_BEGIN();\n}\n",
    );

    let ws = Workspace::new();
    ws.initialize(root).unwrap();
    let root = ws.root().unwrap();
    let module = root.join("python/mxnet/executor.py");
    let text = fs::read_to_string(&module).unwrap();

    let defs = ws.definitions_at(&module, &split_lines(&text), Position::new(1, 25));

    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].path, root.join("src/c_api/c_api_executor.cc"));
}

#[test]
fn test_settings_from_toml() {
    let settings = Settings::from_toml_str(
        "[workspace]\nscan_dirs = [\"lib\"]\n\n[dialects]\nenabled = [\"torch\"]\n",
    )
    .unwrap();
    assert_eq!(settings.workspace.scan_dirs, vec!["lib"]);
    assert_eq!(settings.workspace.extensions.len(), 4);
    assert_eq!(settings.dialects.enabled, vec!["torch"]);
}

#[test]
fn test_configured_scan_dirs_limit_the_index() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    write(root, "ffi-navigator.toml", "[workspace]\nscan_dirs = [\"lib\"]\n[dialects]\nenabled = [\"tvm\"]\n");
    write(root, "lib/a.cc", "TVM_REGISTER_GLOBAL(\"lib.a\")\n");
    write(root, "src/b.cc", "TVM_REGISTER_GLOBAL(\"src.b\")\n");

    let ws = Workspace::new();
    ws.initialize(root).unwrap();

    assert_eq!(ws.defs_for_key("lib.a").len(), 1);
    assert!(ws.defs_for_key("src.b").is_empty());
    assert_eq!(ws.stats().unwrap().files, 1);
}

#[test]
fn test_dedup_locations_is_public() {
    assert!(dedup_locations(Vec::new()).is_empty());
}
