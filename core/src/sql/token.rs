/// SQL keywords and punctuation.
#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    SELECT,
    DISTINCT,
    FROM,
    WHERE,
    AND,
    OR,
    NOT,
    IN,
    IS,
    NULL,
    LIKE,
    ESCAPE,
    AS,
    JOIN,
    ON,
    GROUP_BY,
    ORDER_BY,
    ASC,
    DESC,
    LIMIT,
    OFFSET,
    FALSE,
    LPAREN,
    RPAREN,
    COMMA,
    STAR,
    EQ,
    NE,
    LT,
    GT,
    LE,
    GE,
}

impl Token {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Token::SELECT => "SELECT",
            Token::DISTINCT => "DISTINCT",
            Token::FROM => "FROM",
            Token::WHERE => "WHERE",
            Token::AND => "AND",
            Token::OR => "OR",
            Token::NOT => "NOT",
            Token::IN => "IN",
            Token::IS => "IS",
            Token::NULL => "NULL",
            Token::LIKE => "LIKE",
            Token::ESCAPE => "ESCAPE",
            Token::AS => "AS",
            Token::JOIN => "JOIN",
            Token::ON => "ON",
            Token::GROUP_BY => "GROUP BY",
            Token::ORDER_BY => "ORDER BY",
            Token::ASC => "ASC",
            Token::DESC => "DESC",
            Token::LIMIT => "LIMIT",
            Token::OFFSET => "OFFSET",
            Token::FALSE => "FALSE",
            Token::LPAREN => "(",
            Token::RPAREN => ")",
            Token::COMMA => ",",
            Token::STAR => "*",
            Token::EQ => "=",
            Token::NE => "<>",
            Token::LT => "<",
            Token::GT => ">",
            Token::LE => "<=",
            Token::GE => ">=",
        }
    }

    /// Comparison operators get a space on both sides.
    pub const fn is_operator(&self) -> bool {
        matches!(
            self,
            Token::EQ | Token::NE | Token::LT | Token::GT | Token::LE | Token::GE
        )
    }
}
