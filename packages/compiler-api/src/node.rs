/// A parsed source file owned by the program.
///
/// The builder never inspects syntax; it only needs identity (`file_name`,
/// `version`), the externally visible declaration summary used for shape
/// signatures, and the file's direct references.
pub trait SourceFile {
    fn file_name(&self) -> &str;

    fn text(&self) -> &str;

    /// Opaque content identity (content hash or mtime-derived token). Two
    /// files with equal versions are treated as textually identical.
    fn version(&self) -> String;

    /// Summary of the file's externally observable declarations. Hashing this
    /// yields the file's shape signature. Defaults to the full text for
    /// compilers that do not separate declaration output.
    fn declaration_text(&self) -> String {
        self.text().to_string()
    }

    /// File names directly referenced by this file (imports, exports,
    /// reference directives). Targets need not exist in the program.
    fn referenced_file_names(&self) -> Vec<String>;

    fn is_declaration_file(&self) -> bool {
        false
    }
}
