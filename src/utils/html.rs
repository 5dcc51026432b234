use ammonia;

/// Clean converted lesson HTML using the ammonia library.
///
/// Whitelist-based sanitization: the structural tags the document
/// converter produces (<p>, <h1>..<h6>, <strong>, <em>, <ul>, <li>,
/// <table>, ...) survive, while anything executable that a crafted
/// document could smuggle into the fragment is stripped before it
/// reaches the store.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
