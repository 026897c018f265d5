//! HTML entity decoding for feed text.
//!
//! Feed producers frequently escape markup twice, so after the XML parser
//! has resolved its own entities the text can still contain `&amp;`,
//! `&eacute;` and friends. This decodes one more level.

/// Longest entity name we try to resolve, excluding `&` and `;`.
const MAX_ENTITY_LEN: usize = 10;

/// Decode HTML character references in `text`.
///
/// Named entities outside the known table, malformed numeric references and
/// bare ampersands are kept as-is.
pub fn decode_html_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut result = String::with_capacity(text.len());
    let mut in_entity = false;
    let mut entity = String::new();

    for ch in text.chars() {
        if in_entity {
            match ch {
                ';' => {
                    in_entity = false;
                    match decode_entity(&entity) {
                        Some(c) => result.push(c),
                        None => {
                            result.push('&');
                            result.push_str(&entity);
                            result.push(';');
                        }
                    }
                }
                c if (c.is_ascii_alphanumeric() || (c == '#' && entity.is_empty()))
                    && entity.len() < MAX_ENTITY_LEN =>
                {
                    entity.push(c);
                }
                '&' => {
                    result.push('&');
                    result.push_str(&entity);
                    entity.clear();
                }
                c => {
                    in_entity = false;
                    result.push('&');
                    result.push_str(&entity);
                    result.push(c);
                }
            }
        } else if ch == '&' {
            in_entity = true;
            entity.clear();
        } else {
            result.push(ch);
        }
    }

    if in_entity {
        result.push('&');
        result.push_str(&entity);
    }

    result
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(code) = parse_numeric_entity(entity) {
        return char::from_u32(code);
    }
    named_entity(entity)
}

/// Parse a numeric HTML entity (e.g., "#123" or "#x7B").
fn parse_numeric_entity(entity: &str) -> Option<u32> {
    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse().ok()
    } else {
        None
    }
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "iexcl" => '¡',
        "cent" => '¢',
        "pound" => '£',
        "curren" => '¤',
        "yen" => '¥',
        "brvbar" => '¦',
        "sect" => '§',
        "uml" => '¨',
        "copy" => '©',
        "ordf" => 'ª',
        "laquo" => '«',
        "not" => '¬',
        "shy" => '\u{ad}',
        "reg" => '®',
        "macr" => '¯',
        "deg" => '°',
        "plusmn" => '±',
        "sup2" => '²',
        "sup3" => '³',
        "acute" => '´',
        "micro" => 'µ',
        "para" => '¶',
        "middot" => '·',
        "cedil" => '¸',
        "sup1" => '¹',
        "ordm" => 'º',
        "raquo" => '»',
        "frac14" => '¼',
        "frac12" => '½',
        "frac34" => '¾',
        "iquest" => '¿',
        "Agrave" => 'À',
        "Aacute" => 'Á',
        "Acirc" => 'Â',
        "Atilde" => 'Ã',
        "Auml" => 'Ä',
        "Aring" => 'Å',
        "AElig" => 'Æ',
        "Ccedil" => 'Ç',
        "Egrave" => 'È',
        "Eacute" => 'É',
        "Ecirc" => 'Ê',
        "Euml" => 'Ë',
        "Igrave" => 'Ì',
        "Iacute" => 'Í',
        "Icirc" => 'Î',
        "Iuml" => 'Ï',
        "ETH" => 'Ð',
        "Ntilde" => 'Ñ',
        "Ograve" => 'Ò',
        "Oacute" => 'Ó',
        "Ocirc" => 'Ô',
        "Otilde" => 'Õ',
        "Ouml" => 'Ö',
        "times" => '×',
        "Oslash" => 'Ø',
        "Ugrave" => 'Ù',
        "Uacute" => 'Ú',
        "Ucirc" => 'Û',
        "Uuml" => 'Ü',
        "Yacute" => 'Ý',
        "THORN" => 'Þ',
        "szlig" => 'ß',
        "agrave" => 'à',
        "aacute" => 'á',
        "acirc" => 'â',
        "atilde" => 'ã',
        "auml" => 'ä',
        "aring" => 'å',
        "aelig" => 'æ',
        "ccedil" => 'ç',
        "egrave" => 'è',
        "eacute" => 'é',
        "ecirc" => 'ê',
        "euml" => 'ë',
        "igrave" => 'ì',
        "iacute" => 'í',
        "icirc" => 'î',
        "iuml" => 'ï',
        "eth" => 'ð',
        "ntilde" => 'ñ',
        "ograve" => 'ò',
        "oacute" => 'ó',
        "ocirc" => 'ô',
        "otilde" => 'õ',
        "ouml" => 'ö',
        "divide" => '÷',
        "oslash" => 'ø',
        "ugrave" => 'ù',
        "uacute" => 'ú',
        "ucirc" => 'û',
        "uuml" => 'ü',
        "yacute" => 'ý',
        "thorn" => 'þ',
        "yuml" => 'ÿ',
        "OElig" => 'Œ',
        "oelig" => 'œ',
        "Scaron" => 'Š',
        "scaron" => 'š',
        "Yuml" => 'Ÿ',
        "fnof" => 'ƒ',
        "circ" => 'ˆ',
        "tilde" => '˜',
        "ensp" => '\u{2002}',
        "emsp" => '\u{2003}',
        "thinsp" => '\u{2009}',
        "zwnj" => '\u{200c}',
        "zwj" => '\u{200d}',
        "ndash" => '–',
        "mdash" => '—',
        "lsquo" => '‘',
        "rsquo" => '’',
        "sbquo" => '‚',
        "ldquo" => '“',
        "rdquo" => '”',
        "bdquo" => '„',
        "dagger" => '†',
        "Dagger" => '‡',
        "bull" => '•',
        "hellip" => '…',
        "permil" => '‰',
        "prime" => '′',
        "Prime" => '″',
        "lsaquo" => '‹',
        "rsaquo" => '›',
        "euro" => '€',
        "trade" => '™',
        "larr" => '←',
        "rarr" => '→',
        "harr" => '↔',
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(decode_html_entities("Hello, world"), "Hello, world");
        assert_eq!(decode_html_entities(""), "");
    }

    #[test]
    fn test_basic_entities() {
        assert_eq!(decode_html_entities("&amp;"), "&");
        assert_eq!(decode_html_entities("&lt;p&gt;"), "<p>");
        assert_eq!(decode_html_entities("&quot;quoted&quot;"), "\"quoted\"");
        assert_eq!(decode_html_entities("it&apos;s"), "it's");
    }

    #[test]
    fn test_named_latin1_entities() {
        assert_eq!(decode_html_entities("Caf&eacute; &amp; News"), "Café & News");
        assert_eq!(decode_html_entities("&copy; 2024"), "© 2024");
        assert_eq!(decode_html_entities("na&iuml;ve"), "naïve");
    }

    #[test]
    fn test_typographic_entities() {
        assert_eq!(decode_html_entities("&ldquo;hi&rdquo;"), "“hi”");
        assert_eq!(decode_html_entities("wait&hellip;"), "wait…");
    }

    #[test]
    fn test_numeric_entities() {
        assert_eq!(decode_html_entities("&#65;"), "A");
        assert_eq!(decode_html_entities("&#x41;"), "A");
        assert_eq!(decode_html_entities("&#X41;"), "A");
        assert_eq!(decode_html_entities("&#x3042;"), "あ");
    }

    #[test]
    fn test_unknown_entity_kept() {
        assert_eq!(decode_html_entities("&bogus;"), "&bogus;");
        assert_eq!(decode_html_entities("&#xZZ;"), "&#xZZ;");
    }

    #[test]
    fn test_bare_ampersands_kept() {
        assert_eq!(decode_html_entities("AT&T"), "AT&T");
        assert_eq!(decode_html_entities("Tom & Jerry"), "Tom & Jerry");
        assert_eq!(decode_html_entities("a && b"), "a && b");
        assert_eq!(decode_html_entities("a &&amp; b"), "a && b");
    }

    #[test]
    fn test_single_level_only() {
        assert_eq!(decode_html_entities("&amp;amp;"), "&amp;");
    }

    #[test]
    fn test_overlong_entity_kept() {
        let text = "&averyveryverylongname;";
        assert_eq!(decode_html_entities(text), text);
    }

    #[test]
    fn test_parse_numeric_entity() {
        assert_eq!(parse_numeric_entity("#65"), Some(65));
        assert_eq!(parse_numeric_entity("#x41"), Some(65));
        assert_eq!(parse_numeric_entity("#12354"), Some(12354));
        assert_eq!(parse_numeric_entity("amp"), None);
    }
}
