/// SQL keywords, operators and punctuation.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    SELECT,
    FROM,
    WHERE,
    AND,
    ORDER,
    BY,
    ASC,
    DESC,
    LIMIT,
    OFFSET,
    INSERT,
    INTO,
    VALUES,
    UPDATE,
    SET,
    DELETE,
    IS,
    NOT,
    NULL,
    IN,
    LIKE,
    ILIKE,
    EQ,
    NE,
    GT,
    GE,
    LT,
    LE,
    STAR,
    COMMA,
    LPAREN,
    RPAREN,
}

impl Token {
    pub const fn as_str(self) -> &'static str {
        match self {
            Token::SELECT => "SELECT",
            Token::FROM => "FROM",
            Token::WHERE => "WHERE",
            Token::AND => "AND",
            Token::ORDER => "ORDER",
            Token::BY => "BY",
            Token::ASC => "ASC",
            Token::DESC => "DESC",
            Token::LIMIT => "LIMIT",
            Token::OFFSET => "OFFSET",
            Token::INSERT => "INSERT",
            Token::INTO => "INTO",
            Token::VALUES => "VALUES",
            Token::UPDATE => "UPDATE",
            Token::SET => "SET",
            Token::DELETE => "DELETE",
            Token::IS => "IS",
            Token::NOT => "NOT",
            Token::NULL => "NULL",
            Token::IN => "IN",
            Token::LIKE => "LIKE",
            Token::ILIKE => "ILIKE",
            Token::EQ => "=",
            Token::NE => "!=",
            Token::GT => ">",
            Token::GE => ">=",
            Token::LT => "<",
            Token::LE => "<=",
            Token::STAR => "*",
            Token::COMMA => ",",
            Token::LPAREN => "(",
            Token::RPAREN => ")",
        }
    }

    /// Comparison operators get a space on both sides.
    pub const fn is_operator(self) -> bool {
        matches!(
            self,
            Token::EQ | Token::NE | Token::GT | Token::GE | Token::LT | Token::LE
        )
    }

    /// Keywords and `*` separate from neighbouring words with a space.
    pub const fn is_word_like(self) -> bool {
        !matches!(self, Token::COMMA | Token::LPAREN | Token::RPAREN) && !self.is_operator()
    }
}
