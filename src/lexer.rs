//! 検索クエリの字句解析器

use crate::token::{Span, Token, TokenKind};

pub struct Lexer<'a> {
    input: &'a str,
    /// 入力文字列内の現在位置（バイトインデックス）
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, position: 0 }
    }

    /// 現在位置の文字を返す。位置は進めない
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// 位置を1文字進め、その文字を返す
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    /// 空白文字をスキップする
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// 引用符フレーズを読み取る
    /// 注意：開始の引用符は呼び出し側で消費済み。
    /// 閉じ引用符が無い場合と中身が空（`""`）の場合は、
    /// 引用符を先頭に含むただの単語として読み直す
    fn read_phrase_or_word(&mut self, start: usize) -> Token<'a> {
        let rest = &self.input[self.position..];
        match rest.find('"') {
            Some(rel) if rel > 0 => {
                self.position += rel + 1;
                let text = &self.input[start..self.position];
                Token {
                    kind: TokenKind::Phrase(text),
                    span: Span::new(start, self.position),
                }
            }
            _ => self.read_word(start),
        }
    }

    /// 単語を読み取る
    /// 単語は空白と括弧以外の文字の最長の並び
    fn read_word(&mut self, start: usize) -> Token<'a> {
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '(' || c == ')' {
                break;
            }
            self.bump();
        }
        let literal = &self.input[start..self.position];
        let kind = if literal == "OR" {
            TokenKind::Or
        } else {
            TokenKind::Word(literal)
        };
        Token {
            kind,
            span: Span::new(start, self.position),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        let start = self.position;

        let Some(c) = self.bump() else {
            return None; // 入力の終端
        };

        let token = match c {
            '(' => Token {
                kind: TokenKind::LParen,
                span: Span::new(start, self.position),
            },
            ')' => Token {
                kind: TokenKind::RParen,
                span: Span::new(start, self.position),
            },
            '"' => self.read_phrase_or_word(start),
            _ => self.read_word(start),
        };
        Some(token)
    }
}
