//! Temperature bus adapter: DS18B20 sensors on a shared 1-Wire pin.
//!
//! Sensors are addressed by bus-scan order; the two configured display
//! labels pair with scan indices 0 and 1. A missing or failed sensor
//! reads as [`DISCONNECTED_C`], never an error.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{SensorBusPort, DISCONNECTED_C};

#[cfg(target_os = "espidf")]
use ds18b20::{Ds18b20, Resolution};
#[cfg(target_os = "espidf")]
use esp_idf_hal::{
    delay::Ets,
    gpio::{AnyIOPin, InputOutput, PinDriver, Pull},
};
#[cfg(target_os = "espidf")]
use one_wire_bus::{Address, OneWire};

#[cfg(target_os = "espidf")]
struct Bus {
    one_wire: OneWire<PinDriver<'static, AnyIOPin, InputOutput>>,
    /// DS18B20 addresses in bus-scan order.
    addresses: Vec<Address>,
    delay: Ets,
}

pub struct OneWireAdapter {
    pin: u8,

    #[cfg(target_os = "espidf")]
    bus: Option<Bus>,

    #[cfg(not(target_os = "espidf"))]
    sim_temps: Vec<f32>,
}

impl OneWireAdapter {
    pub fn new() -> Self {
        Self {
            pin: 0,
            #[cfg(target_os = "espidf")]
            bus: None,
            #[cfg(not(target_os = "espidf"))]
            sim_temps: Vec::new(),
        }
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Inject a reading for the sensor at `index` (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_temperature(&mut self, index: usize, celsius: f32) {
        if self.sim_temps.len() <= index {
            self.sim_temps.resize(index + 1, DISCONNECTED_C);
        }
        self.sim_temps[index] = celsius;
    }

    #[cfg(target_os = "espidf")]
    fn scan(bus: &mut Bus) {
        bus.addresses.clear();
        for device in bus.one_wire.devices(false, &mut bus.delay) {
            match device {
                Ok(address) if address.family_code() == ds18b20::FAMILY_CODE => {
                    bus.addresses.push(address);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("1-Wire scan failed: {e:?}");
                    break;
                }
            }
        }
        info!("1-Wire: {} DS18B20 device(s)", bus.addresses.len());
    }
}

impl Default for OneWireAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorBusPort for OneWireAdapter {
    fn rebind(&mut self, pin: u8) {
        self.pin = pin;
        info!("1-Wire bus on gpio{pin}");

        #[cfg(target_os = "espidf")]
        {
            self.bus = None;
            // SAFETY: the bus pin is range-checked at config-save time
            // and this adapter is the pin's only driver.
            let io_pin = unsafe { AnyIOPin::new(i32::from(pin)) };
            let driver = PinDriver::input_output_od(io_pin).and_then(|mut d| {
                d.set_pull(Pull::Up)?;
                d.set_high()?;
                Ok(d)
            });
            let driver = match driver {
                Ok(d) => d,
                Err(e) => {
                    warn!("1-Wire pin setup failed: {e}");
                    return;
                }
            };
            match OneWire::new(driver) {
                Ok(one_wire) => {
                    let mut bus = Bus {
                        one_wire,
                        addresses: Vec::new(),
                        delay: Ets,
                    };
                    Self::scan(&mut bus);
                    self.bus = Some(bus);
                }
                Err(e) => warn!("1-Wire bus init failed: {e:?}"),
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.sim_temps.clear();
        }
    }

    fn request_conversion(&mut self) {
        #[cfg(target_os = "espidf")]
        {
            let Some(bus) = self.bus.as_mut() else {
                return;
            };
            if let Err(e) =
                ds18b20::start_simultaneous_temp_measurement(&mut bus.one_wire, &mut bus.delay)
            {
                warn!("DS18B20 conversion start failed: {e:?}");
                return;
            }
            Resolution::Bits12.delay_for_measurement_time(&mut bus.delay);
        }
    }

    fn read_celsius(&mut self, index: usize) -> f32 {
        #[cfg(target_os = "espidf")]
        {
            let Some(bus) = self.bus.as_mut() else {
                return DISCONNECTED_C;
            };
            let Some(&address) = bus.addresses.get(index) else {
                return DISCONNECTED_C;
            };
            let Ok(sensor) = Ds18b20::new::<core::convert::Infallible>(address) else {
                return DISCONNECTED_C;
            };
            match sensor.read_data(&mut bus.one_wire, &mut bus.delay) {
                Ok(data) => data.temperature,
                Err(e) => {
                    warn!("DS18B20 read failed at index {index}: {e:?}");
                    DISCONNECTED_C
                }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.sim_temps
                .get(index)
                .copied()
                .unwrap_or(DISCONNECTED_C)
        }
    }
}
