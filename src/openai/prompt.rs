//! Prompt construction and post-processing for generated documentation.

use tracing::warn;

use super::language::display_name;

pub const REQUIRED_SECTIONS: [&str; 7] = [
    "## 1. Overview",
    "## 2. Key Components",
    "## 3. Parameters/Arguments",
    "## 4. Return Values",
    "## 5. Dependencies",
    "## 6. Usage Examples",
    "## 7. Best Practices",
];

const TEMPLATE_RULE: &str = "ALWAYS follow the exact 7-section template structure provided in the user prompt. \
                             Maintain consistency in formatting, headings, and section organization.";

pub fn system_prompt(language: &str) -> String {
    let (role, subject) = match language {
        "py" => ("an expert Python developer", "Python code"),
        "js" => ("an expert JavaScript developer", "JavaScript code"),
        "ts" => ("an expert TypeScript developer", "TypeScript code"),
        "java" => ("an expert Java developer", "Java code"),
        "cpp" => ("an expert C++ developer", "C++ code"),
        "c" => ("an expert C developer", "C code"),
        "go" => ("an expert Go developer", "Go code"),
        "rs" => ("an expert Rust developer", "Rust code"),
        "php" => ("an expert PHP developer", "PHP code"),
        "rb" => ("an expert Ruby developer", "Ruby code"),
        "html" => ("an expert web developer", "HTML code"),
        "css" => ("an expert web developer", "CSS code"),
        "sql" => ("an expert database developer", "SQL code"),
        "sh" => ("an expert system administrator", "shell scripts"),
        "md" => {
            return format!(
                "You are an expert technical writer. Generate clear, comprehensive documentation for Markdown content. {TEMPLATE_RULE}"
            )
        }
        "json" => ("an expert developer", "JSON configuration files"),
        "yaml" | "yml" => ("an expert developer", "YAML configuration files"),
        "mod" => ("an expert Go developer", "Go module files"),
        "sum" => ("an expert Go developer", "Go dependency files"),
        _ => ("an expert software developer", "the provided code"),
    };
    format!(
        "You are {role} and technical writer. Generate clear, comprehensive documentation for {subject}. {TEMPLATE_RULE}"
    )
}

/// Per-section hints for one kind of file.
struct Guidance {
    overview: &'static str,
    components: &'static str,
    params: &'static str,
    returns: &'static str,
    examples: &'static str,
}

fn guidance(language: &str) -> Guidance {
    match language {
        "mod" => Guidance {
            overview: "This `go.mod` file defines the Go module configuration for the project. Describe the module name, Go version, and purpose of the service/application.",
            components: "As a `go.mod` file, describe the key dependency categories (web framework, database, CLI tools, etc.) rather than classes or functions.",
            params: "_Not applicable to `go.mod` files_, as they specify dependencies and versions rather than function parameters.",
            returns: "_Not applicable._ The `go.mod` file does not define functions or return values.",
            examples: "Include commands like `go mod tidy`, `go build`, `go get`, and project initialization examples.",
        },
        "sum" => Guidance {
            overview: "The `go.sum` file is part of the Go modules system providing cryptographic verification for dependencies.",
            components: "Describe the structure of checksum entries (module path, version, hash) rather than code components.",
            params: "_Not applicable to `go.sum` files_, as they are automatically generated dependency checksums.",
            returns: "_Not applicable._ The `go.sum` file does not define functions or return values.",
            examples: "Include Go commands that interact with go.sum like `go mod verify`, `go build`, `go mod tidy`.",
        },
        "py" => Guidance {
            overview: "This Python file/module [describe main purpose]. Focus on the primary functionality and role within the application.",
            components: "List and describe classes, functions, constants, and key variables. Include class inheritance and method signatures.",
            params: "Document function parameters, their types, default values, and validation requirements.",
            returns: "Document return types, possible return values, and any exceptions that may be raised.",
            examples: "Provide practical code examples showing how to import, instantiate, and use the main components.",
        },
        "go" => Guidance {
            overview: "This Go file/package [describe main purpose]. Focus on the package functionality and exported types.",
            components: "List and describe structs, interfaces, functions, constants, and exported variables.",
            params: "Document function parameters, struct fields, their types, and any validation rules.",
            returns: "Document return types, error conditions, and any side effects.",
            examples: "Show package import, struct initialization, method calls, and error handling patterns.",
        },
        "js" => Guidance {
            overview: "This JavaScript file/module [describe main purpose]. Focus on the primary functionality and exports.",
            components: "List and describe functions, classes, objects, constants, and exported variables.",
            params: "Document function parameters, their types, default values, and validation requirements.",
            returns: "Document return types, possible return values, and any thrown exceptions.",
            examples: "Provide practical code examples showing imports, instantiation, and usage patterns.",
        },
        "ts" => Guidance {
            overview: "This TypeScript file/module [describe main purpose]. Focus on the primary functionality and type definitions.",
            components: "List and describe interfaces, classes, types, functions, and exported members.",
            params: "Document function parameters, their TypeScript types, default values, and constraints.",
            returns: "Document return types, possible return values, and any thrown exceptions.",
            examples: "Show import statements, type usage, class instantiation, and method calls.",
        },
        "json" => Guidance {
            overview: "This JSON file serves as a configuration/data file. Describe its purpose and how it's used in the application.",
            components: "Describe the main configuration sections, data structures, and key-value pairs.",
            params: "_Not applicable to JSON files_, as they contain data structures rather than function parameters.",
            returns: "_Not applicable._ JSON files define data structures and configuration values.",
            examples: "Show how the configuration is loaded and used in the application, including environment-specific variations.",
        },
        "yaml" | "yml" => Guidance {
            overview: "This YAML file serves as a configuration file. Describe its purpose and role in the application or deployment.",
            components: "Describe the main configuration sections, hierarchical structure, and key settings.",
            params: "_Not applicable to YAML files_, as they contain configuration data rather than function parameters.",
            returns: "_Not applicable._ YAML files define configuration structures and values.",
            examples: "Show how the configuration is loaded, validated, and applied in the application or deployment process.",
        },
        _ => Guidance {
            overview: "This file/module [describe main purpose]. Focus on the primary functionality and role within the application.",
            components: "List and describe the main components, functions, classes, or configuration elements.",
            params: "Document parameters, arguments, or configuration options if applicable.",
            returns: "Document return values, outputs, or results if applicable.",
            examples: "Provide practical usage examples and common operations.",
        },
    }
}

pub fn title(file_name: &str) -> String {
    format!("# Documentation: `{file_name}`")
}

/// The user message: the code plus the exact template the answer must follow.
pub fn structured_prompt(code: &str, file_name: &str, language: &str) -> String {
    let g = guidance(language);
    let title = title(file_name);
    let language_name = display_name(language);
    format!(
        r#"
Please generate comprehensive documentation for the following {language_name} file: {file_name}

```{language}
{code}
```

IMPORTANT: Follow this EXACT format and structure for consistency. Use this precise template:

{title}

## 1. Overview

{overview}

---

## 2. Key Components

{components}

---

## 3. Parameters/Arguments

{params}

---

## 4. Return Values

{returns}

---

## 5. Dependencies

List external dependencies, imports, or required modules. For config files, categorize dependencies by purpose. Use tables when appropriate with columns: Package/Module | Purpose/Description

---

## 6. Usage Examples

{examples}

---

## 7. Best Practices

List recommendations, security considerations, maintenance tips, and common pitfalls to avoid. Use bullet points starting with action verbs.

---

FORMATTING REQUIREMENTS:
- Use exactly the heading structure shown above (## 1. Overview, ## 2. Key Components, etc.)
- Always include horizontal separators (---) between sections
- Use **bold** for important terms and concepts
- Use `backticks` for code elements, file names, and technical terms
- Use bullet points for lists (start with -)
- Use tables for dependency lists when appropriate
- Keep consistent spacing and indentation
- End with a summary note if the file is foundational/skeletal

Format the documentation in clear, well-structured Markdown following this exact template.
"#,
        overview = g.overview,
        components = g.components,
        params = g.params,
        returns = g.returns,
        examples = g.examples,
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub documentation: String,
    pub missing_sections: Vec<String>,
}

fn is_section_heading(line: &str) -> bool {
    REQUIRED_SECTIONS.iter().any(|s| line.starts_with(s))
}

/// Forces the title line, puts `---` between consecutive template sections
/// and lists the sections the model left out. Missing sections are reported,
/// never filled in.
pub fn normalize(content: &str, file_name: &str) -> Normalized {
    let title = title(file_name);
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();

    if !content.starts_with(&title) {
        match lines.iter_mut().find(|l| l.starts_with("# ")) {
            Some(heading) => *heading = title.clone(),
            None => {
                lines.insert(0, title.clone());
                lines.insert(1, String::new());
            }
        }
    }

    let missing_sections: Vec<String> = REQUIRED_SECTIONS
        .iter()
        .filter(|s| !content.contains(*s))
        .map(|s| s.to_string())
        .collect();
    if !missing_sections.is_empty() {
        warn!(file = file_name, missing = ?missing_sections, "documentation is missing sections");
    }

    let mut out: Vec<String> = Vec::with_capacity(lines.len() + 3 * REQUIRED_SECTIONS.len());
    let mut inside_section = false;
    for line in lines {
        if is_section_heading(&line) {
            let previous = out.iter().rev().find(|l| !l.trim().is_empty());
            if inside_section && previous.map(|l| l.trim()) != Some("---") {
                out.extend([String::new(), "---".to_string(), String::new()]);
            }
            inside_section = true;
        }
        out.push(line);
    }

    let mut documentation = out.join("\n");
    if content.ends_with('\n') {
        documentation.push('\n');
    }

    Normalized {
        documentation,
        missing_sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_doc(title: &str, separated: bool) -> String {
        let sep = if separated { "\n---\n" } else { "" };
        let mut doc = format!("{title}\n\n");
        for (i, section) in REQUIRED_SECTIONS.iter().enumerate() {
            doc.push_str(&format!("{section}\n\nBody {i}.\n"));
            if i + 1 < REQUIRED_SECTIONS.len() {
                doc.push_str(sep);
            }
            doc.push('\n');
        }
        doc
    }

    #[test]
    fn system_prompts_name_the_language() {
        assert!(system_prompt("rs").contains("Rust developer"));
        assert!(system_prompt("sh").contains("shell scripts"));
        assert!(system_prompt("md").starts_with("You are an expert technical writer."));
        assert!(system_prompt("zig").contains("software developer"));
        assert!(system_prompt("py").contains("7-section template"));
    }

    #[test]
    fn structured_prompt_embeds_code_and_template() {
        let prompt = structured_prompt("print('hi')", "hello.py", "py");
        assert!(prompt.contains("the following Python file: hello.py"));
        assert!(prompt.contains("```py\nprint('hi')\n```"));
        assert!(prompt.contains("# Documentation: `hello.py`"));
        for section in REQUIRED_SECTIONS {
            assert!(prompt.contains(section), "{section} missing");
        }
        assert!(prompt.contains("Document function parameters, their types"));
    }

    #[test]
    fn go_mod_gets_specific_guidance() {
        assert!(structured_prompt("module x", "go.mod", "mod").contains("_Not applicable to `go.mod` files_"));
    }

    #[test]
    fn normalize_fixes_wrong_title() {
        let doc = full_doc("# Docs for hello", true);
        let n = normalize(&doc, "hello.py");
        assert!(n.documentation.starts_with("# Documentation: `hello.py`"));
        assert!(n.missing_sections.is_empty());
    }

    #[test]
    fn normalize_adds_missing_title() {
        let n = normalize("## 1. Overview\n\nText", "a.rs");
        assert!(n.documentation.starts_with("# Documentation: `a.rs`\n\n## 1. Overview"));
        assert_eq!(n.missing_sections.len(), 6);
        assert_eq!(n.missing_sections[0], "## 2. Key Components");
    }

    #[test]
    fn normalize_inserts_separators_once() {
        let n = normalize(&full_doc("# Documentation: `x.go`", false), "x.go");
        assert_eq!(n.documentation.matches("\n---\n").count(), 6);

        let already = full_doc("# Documentation: `x.go`", true);
        let again = normalize(&already, "x.go");
        assert_eq!(again.documentation.matches("\n---\n").count(), 6);
        assert_eq!(normalize(&again.documentation, "x.go").documentation, again.documentation);
    }

    #[test]
    fn normalize_keeps_trailing_newline() {
        let doc = "# Documentation: `a.rs`\n\n## 1. Overview\n\nText\n";
        assert_eq!(normalize(doc, "a.rs").documentation, doc);
        assert!(!normalize("# Documentation: `a.rs`\n\nText", "a.rs").documentation.ends_with('\n'));
    }

    #[test]
    fn normalize_reports_but_does_not_invent_sections() {
        let n = normalize("# Documentation: `x.c`\n\n## 1. Overview\n\nOnly this.", "x.c");
        assert!(!n.documentation.contains("## 2. Key Components"));
        assert_eq!(n.missing_sections.len(), 6);
    }
}
