// src/common/slug.rs

/// "Gerente de Vendas" -> "gerente-de-vendas"
/// Caracteres não alfanuméricos viram separador; separadores repetidos colapsam.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Sales Manager"), "sales-manager");
        assert_eq!(slugify("  --Admin__Panel!! "), "admin-panel");
        assert_eq!(slugify(""), "");
    }
}
