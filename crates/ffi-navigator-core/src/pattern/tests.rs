//! Tests for the pattern toolkit
//!
//! Each matcher is driven with small literal sources, the way a dialect
//! provider would call it.

use std::path::Path;

use super::*;
use crate::facts::Fact;
use crate::position::{Position, Range};

fn lines(text: &str) -> Vec<&str> {
    split_lines(text)
}

// ==================== MACRO MATCHER ====================

mod macro_tests {
    use super::*;

    #[test]
    fn test_register_global_definition() {
        let source = "#include <tvm/runtime/registry.h>\n\nnamespace ns {\nTVM_REGISTER_GLOBAL(\"ns.fn\")\n.set_body(Fn);\n}";
        let matcher = MacroMatcher::new(&["TVM_REGISTER_GLOBAL"]).unwrap();
        let path = Path::new("/repo/src/a.cc");

        let facts = matcher.find(&lines(source), LineWindow::all(), |hit| {
            Some(Fact::def(hit.key, path, hit.range))
        });

        assert_eq!(facts.len(), 1);
        let Fact::Definition(def) = &facts[0] else {
            panic!("expected a definition, got {:?}", facts[0]);
        };
        assert_eq!(def.key, "ns.fn");
        assert_eq!(def.path, path);
        assert_eq!(def.range, Range::on_line(3, 21, 26));
    }

    #[test]
    fn test_reports_which_macro_fired() {
        let source = "TVM_REGISTER_API(\"a\")\nTVM_REGISTER_GLOBAL(\"b\")";
        let matcher = MacroMatcher::new(&["TVM_REGISTER_API", "TVM_REGISTER_GLOBAL"]).unwrap();
        let mut fired = Vec::new();

        matcher.find(&lines(source), LineWindow::all(), |hit| {
            fired.push((hit.name.to_string(), hit.key.to_string()));
            None
        });

        assert_eq!(
            fired,
            vec![
                ("TVM_REGISTER_API".to_string(), "a".to_string()),
                ("TVM_REGISTER_GLOBAL".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_window_limits_lines() {
        let source = "M(\"a\")\nM(\"b\")\nM(\"c\")";
        let matcher = MacroMatcher::new(&["M"]).unwrap();
        let path = Path::new("x.cc");

        let facts = matcher.find(&lines(source), LineWindow::new(1, 2), |hit| {
            Some(Fact::def(hit.key, path, hit.range))
        });
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].key(), Some("b"));

        // An end past the file is clamped
        let facts = matcher.find(&lines(source), LineWindow::new(2, 100), |hit| {
            Some(Fact::def(hit.key, path, hit.range))
        });
        assert_eq!(facts.len(), 1);
    }

    #[test]
    fn test_no_names_is_an_error() {
        assert!(MacroMatcher::new(&[]).is_err());
        assert!(CallSiteSearcher::new(&[]).is_err());
    }
}

// ==================== CALL-SITE SEARCHER ====================

mod searcher_tests {
    use super::*;

    #[test]
    fn test_multiple_lookups_on_one_line() {
        let source = "  auto f = GetPackedFunc(\"x.a\"), g = runtime::Registry::Get(\"x.b\");";
        let searcher = CallSiteSearcher::new(&["GetPackedFunc", "runtime::Registry::Get"]).unwrap();
        let path = Path::new("/repo/src/use.cc");

        let facts = searcher.find(&lines(source), LineWindow::all(), |hit| {
            Some(Fact::reference(hit.key, path, hit.range))
        });

        let keys: Vec<_> = facts.iter().filter_map(|f| f.key()).collect();
        assert_eq!(keys, vec!["x.a", "x.b"]);
        assert_eq!(facts[0].range(), Some(Range::on_line(0, 26, 29)));
    }

    #[test]
    fn test_commented_call_is_still_matched() {
        // Matchers ignore comment context
        let source = "// GetPackedFunc(\"old.name\")";
        let searcher = CallSiteSearcher::new(&["GetPackedFunc"]).unwrap();
        let facts = searcher.find(&lines(source), LineWindow::all(), |hit| {
            Some(Fact::reference(hit.key, Path::new("c.cc"), hit.range))
        });
        assert_eq!(facts.len(), 1);
    }
}

// ==================== DECORATOR MATCHER ====================

mod decorator_tests {
    use super::*;

    #[test]
    fn test_bare_decorator_takes_key_from_next_line() {
        let source = "@register_func\ndef handler():\n    pass";
        let matcher = DecoratorMatcher::new(&["register_func"], "def").unwrap();
        let mut hits = Vec::new();

        matcher.find(&lines(source), LineWindow::all(), |hit| {
            hits.push((hit.key.to_string(), hit.name.to_string(), hit.range));
            None
        });

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "handler");
        assert_eq!(hits[0].1, "register_func");
        assert_eq!(hits[0].2, Range::on_line(1, 4, 11));
    }

    #[test]
    fn test_namespaced_decorator_with_inline_key() {
        let source = "@_reg.register_func(\"test.abc\")\ndef test_xyz():\n    pass";
        let matcher = DecoratorMatcher::new(&["register_func"], "def").unwrap();
        let mut hits = Vec::new();

        matcher.find(&lines(source), LineWindow::all(), |hit| {
            hits.push((hit.key.to_string(), hit.name.to_string(), hit.range));
            None
        });

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "test.abc");
        assert_eq!(hits[0].1, "_reg.register_func");
        assert_eq!(hits[0].2, Range::on_line(0, 21, 29));
    }

    #[test]
    fn test_class_decorators() {
        let source = "@register_relay_node\nclass GlobalVar(Node):\n    pass\n\n@tvm._ffi.register_object(\"test.ABC\")\nclass ABC(ObjectBase):\n    pass";
        let matcher =
            DecoratorMatcher::new(&["register_object", "register_relay_node"], "class").unwrap();
        let mut hits = Vec::new();

        matcher.find(&lines(source), LineWindow::all(), |hit| {
            hits.push((hit.key.to_string(), hit.name.to_string()));
            None
        });

        assert_eq!(
            hits,
            vec![
                ("GlobalVar".to_string(), "register_relay_node".to_string()),
                ("test.ABC".to_string(), "tvm._ffi.register_object".to_string()),
            ]
        );
    }

    #[test]
    fn test_bare_class_decorator_takes_key_from_next_line() {
        let source = "@tvm._ffi.register_object
class ABC(ObjectBase):
    pass";
        let matcher = DecoratorMatcher::new(&["register_object"], "class").unwrap();
        let mut hits = Vec::new();

        matcher.find(&lines(source), LineWindow::all(), |hit| {
            hits.push((hit.key.to_string(), hit.range));
            None
        });

        assert_eq!(hits, vec![("ABC".to_string(), Range::on_line(1, 6, 9))]);
    }

    #[test]
    fn test_bare_decorator_without_declaration_yields_nothing() {
        let source = "@register_func\nx = 1\n@register_func";
        let matcher = DecoratorMatcher::new(&["register_func"], "def").unwrap();
        let facts = matcher.find(&lines(source), LineWindow::all(), |hit| {
            Some(Fact::def(hit.key, Path::new("a.py"), hit.range))
        });
        assert!(facts.is_empty());
    }

    #[test]
    fn test_similar_decorator_name_is_not_matched() {
        let source = "@register_func_v2\ndef handler():\n    pass";
        let matcher = DecoratorMatcher::new(&["register_func"], "def").unwrap();
        let facts = matcher.find(&lines(source), LineWindow::all(), |hit| {
            Some(Fact::def(hit.key, Path::new("a.py"), hit.range))
        });
        assert!(facts.is_empty());
    }
}

// ==================== REGEX MATCHERS ====================

mod regex_tests {
    use super::*;

    #[test]
    fn test_anchored_vs_search() {
        let source = "x = 1; static constexpr const char* _type_key = \"relay.Var\";";
        let pattern = r#"static\s+constexpr\s+const\s+char\s*\*\s*_type_key\s*=\s*"(?P<key>[^"]+)""#;
        let path = Path::new("var.h");

        let anchored = RegexMatcher::new(pattern, MatchMode::Anchored).unwrap();
        let searched = RegexMatcher::new(pattern, MatchMode::Search).unwrap();
        let create = |caps: &regex::Captures<'_>, rg: Range| {
            Some(Fact::def(format!("t:{}", &caps["key"]), path, rg))
        };

        assert!(anchored.find(&lines(source), LineWindow::all(), create).is_empty());
        let facts = searched.find(&lines(source), LineWindow::all(), create);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].key(), Some("t:relay.Var"));
        // Range covers the key group
        assert_eq!(facts[0].range(), Some(Range::on_line(0, 49, 58)));
    }

    #[test]
    fn test_whole_match_range_without_key_group() {
        let source = "    y = ops.quantized.conv2d(x)";
        let matcher = RegexMatcher::new(
            r"ops\.(?P<ns>[a-z0-9_]+)\.(?P<op>[a-z0-9_]+)",
            MatchMode::Search,
        )
        .unwrap();
        let facts = matcher.find(&lines(source), LineWindow::all(), |caps, rg| {
            Some(Fact::reference(
                format!("{}::{}", &caps["ns"], &caps["op"]),
                Path::new("q.py"),
                rg,
            ))
        });
        assert_eq!(facts[0].key(), Some("quantized::conv2d"));
        assert_eq!(facts[0].range(), Some(Range::on_line(0, 8, 28)));
    }

    #[test]
    fn test_invalid_regex_is_reported() {
        assert!(RegexMatcher::new("(unclosed", MatchMode::Search).is_err());
        assert!(MultiLineMatcher::new("[z-a]").is_err());
    }
}

// ==================== MULTI-LINE MATCHER ====================

mod multi_line_tests {
    use super::*;

    const PYBIND_SOURCE: &str = "void export_lang(py::module &m) {\n  m.def(\"begin_frontend\", &begin)\n   .def(\n       \"make_const\", &make_const);\n  py::class_<Program>(m, \"Program\")\n      .def(py::init<>());\n}";

    fn pybind_def() -> MultiLineMatcher {
        MultiLineMatcher::new(r#"\.def\(\s*"(?P<key>[a-z0-9_]+)""#).unwrap()
    }

    #[test]
    fn test_match_spanning_lines() {
        let src = lines(PYBIND_SOURCE);
        let facts = pybind_def().find(&src, |caps, rg| {
            Some(Fact::def(&caps["key"], Path::new("export.cpp"), rg))
        });

        let keys: Vec<_> = facts.iter().filter_map(|f| f.key()).collect();
        assert_eq!(keys, vec!["begin_frontend", "make_const"]);

        let first = facts[0].range().unwrap();
        assert_eq!(first, Range::on_line(1, 3, 24));

        let second = facts[1].range().unwrap();
        assert_eq!(second.start, Position::new(2, 3));
        assert_eq!(second.end, Position::new(3, 19));
    }

    #[test]
    fn test_columns_never_negative_and_ordered() {
        let src = lines(PYBIND_SOURCE);
        let class = MultiLineMatcher::new(
            r#"py::class_<[A-Za-z0-9_:<>]+(?:,\s*[A-Za-z0-9_:<>]+)*>\s*\(\s*m,\s*"(?P<key>[A-Za-z0-9_]+)""#,
        )
        .unwrap();

        let mut ranges = Vec::new();
        for matcher in [&pybind_def(), &class] {
            matcher.find(&src, |_, rg| {
                ranges.push(rg);
                None
            });
        }

        assert_eq!(ranges.len(), 3);
        for rg in ranges {
            assert!(rg.start <= rg.end, "{:?} ends before it starts", rg);
            let start_line = src[rg.start.line as usize];
            let end_line = src[rg.end.line as usize];
            assert!(rg.start.character as usize <= start_line.chars().count());
            assert!(rg.end.character as usize <= end_line.chars().count());
        }
    }

    #[test]
    fn test_match_at_start_of_later_line() {
        let src = lines("a\nbb\n.def(\"x\")");
        let facts = pybind_def().find(&src, |caps, rg| {
            Some(Fact::def(&caps["key"], Path::new("m.cc"), rg))
        });
        assert_eq!(facts[0].range(), Some(Range::on_line(2, 0, 8)));
    }

    #[test]
    fn test_empty_file() {
        let facts = pybind_def().find(&[], |caps, rg| {
            Some(Fact::def(&caps["key"], Path::new("m.cc"), rg))
        });
        assert!(facts.is_empty());
    }
}

// ==================== PYTHON HELPERS ====================

mod python_tests {
    use super::*;

    #[test]
    fn test_find_py_imports() {
        let source = "from . import expr\nfrom . import make as _make, data\nfrom ..base import (Node, register_node)  # comment";
        let imports = find_py_imports(&lines(source));

        assert_eq!(imports.len(), 5);
        assert_eq!(imports[0].from_mod.as_deref(), Some("."));
        assert_eq!(imports[0].name, "expr");
        assert_eq!(imports[0].alias, None);
        assert_eq!(imports[1].name, "make");
        assert_eq!(imports[1].alias.as_deref(), Some("_make"));
        assert_eq!(imports[1].local_name(), "_make");
        assert_eq!(imports[2].name, "data");
        assert_eq!(imports[3].from_mod.as_deref(), Some("..base"));
        assert_eq!(imports[3].name, "Node");
        assert_eq!(imports[4].name, "register_node");
    }

    #[test]
    fn test_plain_imports() {
        let source = "import os\nimport tvm.relay as relay, numpy";
        let imports = find_py_imports(&lines(source));

        assert_eq!(imports.len(), 3);
        assert_eq!(imports[0].from_mod, None);
        assert_eq!(imports[0].local_name(), "os");
        assert_eq!(imports[1].name, "tvm.relay");
        assert_eq!(imports[1].local_name(), "relay");
        assert_eq!(imports[2].local_name(), "numpy");

        let dotted = find_py_imports(&lines("import tvm.contrib.graph"));
        assert_eq!(dotted[0].local_name(), "tvm");
    }

    #[test]
    fn test_star_import_is_skipped() {
        assert!(find_py_imports(&lines("from .op import *")).is_empty());
    }

    #[test]
    fn test_search_symbol_whole_tokens() {
        let source = "x = _make.Let(a)\ny = _make2(b)\nz = [_make, _make]";
        let ranges = search_symbol(&lines(source), &["_make"]);

        assert_eq!(
            ranges,
            vec![
                Range::on_line(0, 4, 9),
                Range::on_line(2, 5, 10),
                Range::on_line(2, 12, 17),
            ]
        );
    }

    #[test]
    fn test_search_symbol_at_line_edges() {
        let ranges = search_symbol(&lines("Let\n  return Let"), &["Let"]);
        assert_eq!(
            ranges,
            vec![Range::on_line(0, 0, 3), Range::on_line(1, 9, 12)]
        );
    }

    #[test]
    fn test_search_symbol_without_terms() {
        assert!(search_symbol(&lines("anything"), &[]).is_empty());
        assert!(search_symbol(&lines("anything"), &[""]).is_empty());
    }

    #[test]
    fn test_extract_symbol_with_namespace() {
        let source = "\nself.f(_make.Let)\n\n@register_relay_node\nclass GlobalVar(Node)";
        let sym = extract_symbol(&lines(source), Position::new(1, 13)).unwrap();
        assert_eq!(sym.value, "_make.Let");

        let sym = extract_symbol(&lines(source), Position::new(4, 8)).unwrap();
        assert_eq!(sym.value, "GlobalVar");
    }

    #[test]
    fn test_extract_symbol_inside_string_is_none() {
        let source = "f = get_global_func(\"relay.backend.lower\")";
        assert_eq!(extract_symbol(&lines(source), Position::new(0, 25)), None);
    }

    #[test]
    fn test_extract_symbol_out_of_range() {
        assert_eq!(extract_symbol(&lines("a"), Position::new(5, 0)), None);
        assert_eq!(extract_symbol(&lines("   "), Position::new(0, 1)), None);
    }
}
