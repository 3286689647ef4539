#[cfg(all(test, feature = "loom"))]
mod tests {
    use crate::{channel, BipBuffer, WakeupStrategy};
    use loom::{model::Builder, thread};

    #[test]
    fn test_single_writer_single_reader() {
        let mut builder = Builder::new();
        if builder.preemption_bound.is_none() {
            builder.preemption_bound = Some(3);
        }

        builder.check(|| {
            let (writer, reader) = channel(BipBuffer::new(64).unwrap(), WakeupStrategy::Forced);
            let num_messages = 3;

            let writer_handle = thread::spawn(move || {
                for i in 0..num_messages {
                    let data = format!("message_{}", i);
                    writer.send(data.as_bytes()).unwrap();
                }
            });

            let mut received = vec![];
            let mut out = [0u8; 32];
            while let Some(n) = reader.read_blocking(&mut out).unwrap() {
                received.push(String::from_utf8(out[..n].to_vec()).unwrap());
            }

            writer_handle.join().unwrap();

            assert_eq!(received.len(), num_messages);
            for (i, message) in received.iter().enumerate() {
                assert_eq!(*message, format!("message_{}", i));
            }
        });
    }

    #[test]
    fn test_wrap_under_contention() {
        let mut builder = Builder::new();
        if builder.preemption_bound.is_none() {
            builder.preemption_bound = Some(2);
        }

        builder.check(|| {
            // Room for two 10-byte records, so the third has to wrap.
            let (writer, reader) = channel(BipBuffer::new(24).unwrap(), WakeupStrategy::Forced);

            let writer_handle = thread::spawn(move || {
                for i in 0..3u8 {
                    while writer.send(&[i; 10]).is_err() {
                        thread::yield_now();
                    }
                }
            });

            let mut out = [0u8; 10];
            for i in 0..3u8 {
                let n = reader.read_blocking(&mut out).unwrap();
                assert_eq!(n, Some(10));
                assert_eq!(out, [i; 10]);
            }

            writer_handle.join().unwrap();
            assert_eq!(reader.read_blocking(&mut out).unwrap(), None);
        });
    }
}
