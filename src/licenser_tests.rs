#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    use crate::licenser::{
        apply_header, stamp_tree, HeaderStyle, CPP_LICENSE_HEADER, LUAU_LICENSE_HEADER,
        PY_LICENSE_HEADER,
    };
    use crate::test_support::{generate_class, record_with_config};

    const STALE_CPP: &str = "// SPDX-License-Identifier: MIT\n/*\n * old project\n */\n\n#pragma once\n";

    #[test]
    fn test_style_from_extension() {
        assert_eq!(
            HeaderStyle::for_path(Path::new("a/Sound.hpp")),
            Some(HeaderStyle::Cpp)
        );
        assert_eq!(
            HeaderStyle::for_path(Path::new("Sound.cpp")),
            Some(HeaderStyle::Cpp)
        );
        assert_eq!(
            HeaderStyle::for_path(Path::new("init.luau")),
            Some(HeaderStyle::Luau)
        );
        assert_eq!(
            HeaderStyle::for_path(Path::new("sbxcg/main.py")),
            Some(HeaderStyle::Python)
        );
        assert_eq!(HeaderStyle::for_path(Path::new("CMakeLists.txt")), None);
        assert_eq!(HeaderStyle::for_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_missing_header_is_prepended() {
        let updated = apply_header("#pragma once\n", HeaderStyle::Cpp).unwrap();
        assert_eq!(updated, format!("{}#pragma once\n", CPP_LICENSE_HEADER));
    }

    #[test]
    fn test_exact_header_is_left_alone() {
        let text = format!("{}#pragma once\n", CPP_LICENSE_HEADER);
        assert_eq!(apply_header(&text, HeaderStyle::Cpp), None);
    }

    #[test]
    fn test_stale_header_is_replaced() {
        let updated = apply_header(STALE_CPP, HeaderStyle::Cpp).unwrap();
        assert_eq!(updated, format!("{}#pragma once\n", CPP_LICENSE_HEADER));
        assert!(!updated.contains("old project"));
        // A second pass settles
        assert_eq!(apply_header(&updated, HeaderStyle::Cpp), None);
    }

    #[test]
    fn test_luau_and_python_headers() {
        let luau = apply_header("return {}\n", HeaderStyle::Luau).unwrap();
        assert!(luau.starts_with("-- SPDX-License-Identifier: LGPL-3.0-or-later\n"));
        assert_eq!(apply_header(&luau, HeaderStyle::Luau), None);

        let py = apply_header("import sys\n", HeaderStyle::Python).unwrap();
        assert_eq!(py, format!("{}import sys\n", PY_LICENSE_HEADER));
        assert_eq!(apply_header(&py, HeaderStyle::Python), None);

        assert!(LUAU_LICENSE_HEADER.ends_with("\n\n"));
    }

    #[test]
    fn test_generated_artifacts_are_already_stamped() {
        let generated =
            generate_class("Sound", &record_with_config("Sound", r#"{"members": {"Play": {}}}"#))
                .unwrap();
        assert_eq!(apply_header(&generated.header, HeaderStyle::Cpp), None);
        assert_eq!(apply_header(&generated.source, HeaderStyle::Cpp), None);
    }

    #[test]
    fn test_stamp_tree_walks_and_skips() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/Classes")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("target/debug")).unwrap();

        fs::write(root.join("src/Classes/Sound.cpp"), "int x;\n").unwrap();
        fs::write(
            root.join("src/Classes/Folder.cpp"),
            format!("{}int y;\n", CPP_LICENSE_HEADER),
        )
        .unwrap();
        fs::write(root.join("tool.py"), "print()\n").unwrap();
        fs::write(root.join("notes.md"), "# notes\n").unwrap();
        fs::write(root.join(".git/hook.py"), "x = 1\n").unwrap();
        fs::write(root.join("target/debug/gen.cpp"), "int z;\n").unwrap();

        let report = stamp_tree(root).unwrap();
        assert_eq!(
            report.stamped,
            vec![root.join("src/Classes/Sound.cpp"), root.join("tool.py")]
        );
        assert_eq!(report.skipped, vec![root.join("src/Classes/Folder.cpp")]);

        let sound = fs::read_to_string(root.join("src/Classes/Sound.cpp")).unwrap();
        assert_eq!(sound, format!("{}int x;\n", CPP_LICENSE_HEADER));
        assert_eq!(fs::read_to_string(root.join("notes.md")).unwrap(), "# notes\n");
        assert_eq!(fs::read_to_string(root.join(".git/hook.py")).unwrap(), "x = 1\n");
        assert_eq!(
            fs::read_to_string(root.join("target/debug/gen.cpp")).unwrap(),
            "int z;\n"
        );

        let again = stamp_tree(root).unwrap();
        assert!(again.stamped.is_empty());
        assert_eq!(again.skipped.len(), 3);
    }
}
