// =============================================================================
// SERIAL LOG SINK - ZERO OVERHEAD
// =============================================================================
//
// Saída dos macros de log (kinfo!, kerror!, ...).
//
// ARQUITETURA:
// - A placa registra um `SerialSink` (UART, ITM, RTT...) uma única vez
// - SEM core::fmt - números são convertidos para hex à mão
// - SEM alocação - buffers de stack de tamanho fixo
// - Sem sink registrado, tudo vira no-op (host, testes)
//
// FUNÇÕES DISPONÍVEIS:
// - emit_str(s)      : Envia string literal
// - emit_hex(v)      : Envia u64 em hexadecimal (0x + 16 dígitos)
// - emit_nl()        : Envia newline (\r\n)
//
// NOTA IMPORTANTE:
// O sink NÃO é protegido por lock. Logs emitidos pelo tick e pelo loop
// principal podem se intercalar. Isso é aceitável para diagnóstico.
//
// =============================================================================

use spin::Once;

/// Destino dos bytes de log
pub trait SerialSink: Sync {
    fn write_bytes(&self, bytes: &[u8]);
}

static SINK: Once<&'static dyn SerialSink> = Once::new();

// =============================================================================
// FUNÇÕES DE INICIALIZAÇÃO
// =============================================================================

/// Registra o sink de log.
///
/// Deve ser chamada uma vez durante o boot. Chamadas posteriores são
/// ignoradas e retornam `false`.
pub fn init(sink: &'static dyn SerialSink) -> bool {
    let mut installed = false;
    SINK.call_once(|| {
        installed = true;
        sink
    });
    installed
}

// =============================================================================
// FUNÇÕES DE ESCRITA
// =============================================================================

#[inline]
fn write_bytes(bytes: &[u8]) {
    if let Some(sink) = SINK.get() {
        sink.write_bytes(bytes);
    }
}

/// Envia uma string.
#[inline(never)]
pub fn emit_str(s: &str) {
    write_bytes(s.as_bytes());
}

/// Envia uma nova linha (CRLF).
#[inline(never)]
pub fn emit_nl() {
    write_bytes(b"\r\n");
}

/// Envia um valor u64 em formato hexadecimal.
///
/// Formato de saída: 0x0123456789ABCDEF (sempre 18 caracteres)
#[inline(never)]
pub fn emit_hex(value: u64) {
    write_bytes(&format_hex(value));
}

// =============================================================================
// FUNÇÕES AUXILIARES
// =============================================================================

/// Converte u64 para "0x" + 16 dígitos hex maiúsculos.
pub const fn format_hex(value: u64) -> [u8; 18] {
    let mut out = [0u8; 18];
    out[0] = b'0';
    out[1] = b'x';
    let mut i = 0;
    while i < 16 {
        let shift = 60 - i * 4;
        out[2 + i] = nibble_to_ascii(((value >> shift) & 0xF) as u8);
        i += 1;
    }
    out
}

/// Converte nibble (0-15) para caractere ASCII ('0'-'9', 'A'-'F').
#[inline(always)]
const fn nibble_to_ascii(n: u8) -> u8 {
    if n < 10 {
        b'0' + n
    } else {
        b'A' + (n - 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hex() {
        assert_eq!(&format_hex(0x1F), b"0x000000000000001F");
        assert_eq!(&format_hex(u64::MAX), b"0xFFFFFFFFFFFFFFFF");
    }

    #[test]
    fn test_emit_without_sink_is_noop() {
        // Nenhum teste registra sink; emitir não pode entrar em pânico.
        emit_str("(Test) sem sink");
        emit_hex(0xABCD);
        emit_nl();
    }
}
